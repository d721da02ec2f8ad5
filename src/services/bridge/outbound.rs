//! Outbound Relay Handler
//!
//! Sends operator text to the active conversation.

use super::adapters::{ControlChannel, SourcePlatform};
use super::response_mapper::{ResponseMapper, NO_CHAT_SELECTED};
use super::session_router::SessionRouter;
use super::types::BridgeError;
use std::sync::Arc;

/// Result of relaying one operator message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    Delivered { destination: i64 },
    /// No active conversation; the operator was told so
    NoDestination,
    /// The Source Platform rejected the send; the operator was told so
    Failed { destination: i64, reason: String },
}

pub struct OutboundRelay {
    source: Arc<dyn SourcePlatform>,
    control: Arc<dyn ControlChannel>,
    router: Arc<SessionRouter>,
}

impl OutboundRelay {
    pub fn new(
        source: Arc<dyn SourcePlatform>,
        control: Arc<dyn ControlChannel>,
        router: Arc<SessionRouter>,
    ) -> Self {
        Self {
            source,
            control,
            router,
        }
    }

    /// Relay `text` verbatim to the active conversation.
    ///
    /// The destination is read right before sending, so a selection made
    /// while this message was queued is honoured. `awaiting_reply` is
    /// cleared whatever the outcome.
    pub async fn handle_text(&self, text: &str) -> Result<OutboundOutcome, BridgeError> {
        let Some(destination) = self.router.active_destination().await else {
            tracing::debug!("outbound text without an active conversation");
            self.router.clear_awaiting_reply().await;
            self.control.send_text(NO_CHAT_SELECTED).await?;
            return Ok(OutboundOutcome::NoDestination);
        };

        let sent = self.source.send_message(destination, text).await;
        self.router.clear_awaiting_reply().await;

        match sent {
            Ok(()) => {
                tracing::debug!(destination, "relayed outbound message");
                Ok(OutboundOutcome::Delivered { destination })
            }
            Err(e) => {
                tracing::warn!(destination, "Failed to deliver outbound message: {}", e);
                self.control
                    .send_text(&ResponseMapper::format_delivery_failure(&e))
                    .await?;
                Ok(OutboundOutcome::Failed {
                    destination,
                    reason: e.to_string(),
                })
            }
        }
    }
}
