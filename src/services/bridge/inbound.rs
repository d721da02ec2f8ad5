//! Inbound Relay Loop
//!
//! Polls the Source Platform and forwards every new message into the control
//! chat until cancelled. Poll failures back off exponentially and never end
//! the loop.

use super::adapters::{ControlChannel, SourcePlatform};
use super::response_mapper::ResponseMapper;
use super::session_router::SessionRouter;
use super::types::{BridgeError, GatewayStatus, ReconnectConfig, SourceEvent, SourceMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use vk_tg_bridge_core::ConversationDirectory;

/// What happened to one Source Platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Sent to the control chat; `compact` when sent without header
    Forwarded { peer_id: i64, compact: bool },
    Skipped,
}

pub struct InboundRelay {
    pub(crate) source: Arc<dyn SourcePlatform>,
    pub(crate) control: Arc<dyn ControlChannel>,
    pub(crate) router: Arc<SessionRouter>,
    pub(crate) directory: Arc<RwLock<ConversationDirectory>>,
    pub(crate) status: Arc<RwLock<GatewayStatus>>,
    pub(crate) relay_outgoing: bool,
    pub(crate) reconnect: ReconnectConfig,
}

impl InboundRelay {
    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!("inbound relay started");
        let mut attempt: u32 = 0;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.source.poll_events() => polled,
            };

            match polled {
                Ok(events) => {
                    attempt = 0;
                    {
                        let mut status = self.status.write().await;
                        status.poll_failures = 0;
                        status.error = None;
                    }
                    for event in events {
                        if cancel.is_cancelled() {
                            break;
                        }
                        if let Err(e) = self.relay_event(event).await {
                            tracing::warn!("Failed to forward event: {}", e);
                        }
                    }
                }
                Err(e) => {
                    let delay = self.reconnect.delay_for_attempt(attempt);
                    attempt = attempt.saturating_add(1);
                    {
                        let mut status = self.status.write().await;
                        status.poll_failures = attempt;
                        status.error = Some(e.to_string());
                    }
                    tracing::warn!(
                        attempt,
                        delay_ms = delay,
                        "Source poll failed: {}",
                        e
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                    }
                }
            }
        }

        tracing::info!("inbound relay stopped");
    }

    /// Forward one event. Only new messages are relayed.
    pub async fn relay_event(&self, event: SourceEvent) -> Result<RelayOutcome, BridgeError> {
        {
            let mut status = self.status.write().await;
            status.total_events_processed += 1;
            status.last_event_at = Some(chrono::Utc::now().to_rfc3339());
        }

        let message = match event {
            SourceEvent::NewMessage(message) => message,
            SourceEvent::Other { code } => {
                tracing::trace!(code, "discarding non-message event");
                return Ok(RelayOutcome::Skipped);
            }
        };

        if message.outgoing && !self.relay_outgoing {
            tracing::debug!(peer_id = message.peer_id, "skipping outgoing message");
            return Ok(RelayOutcome::Skipped);
        }

        self.forward(message).await
    }

    async fn forward(&self, message: SourceMessage) -> Result<RelayOutcome, BridgeError> {
        let name = self
            .directory
            .read()
            .await
            .display_name_for(message.peer_id);

        let compact = self.router.is_continuation(message.peer_id).await;
        let rendered = ResponseMapper::render_inbound(message.peer_id, &name, &message.text, compact)?;
        self.control.send_rendered(&rendered).await?;
        // Only what the operator actually saw counts toward a run
        self.router.mark_relayed(message.peer_id).await;

        self.status.write().await.inbound_relayed += 1;
        tracing::debug!(
            peer_id = message.peer_id,
            message_id = message.message_id,
            compact,
            "relayed inbound message"
        );

        Ok(RelayOutcome::Forwarded {
            peer_id: message.peer_id,
            compact,
        })
    }
}
