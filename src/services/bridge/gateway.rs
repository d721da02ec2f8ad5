//! Bridge Gateway
//!
//! Owns the adapters and shared state, runs the control dispatch loop and the
//! inbound relay, and reports runtime status.

use super::adapters::{ControlChannel, SourcePlatform};
use super::command_router::{CommandRouter, HELP_TEXT};
use super::inbound::InboundRelay;
use super::outbound::{OutboundOutcome, OutboundRelay};
use super::picker::PickerController;
use super::session_router::SessionRouter;
use super::types::{BridgeError, BridgeSettings, ControlCommand, ControlEvent, GatewayStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use vk_tg_bridge_core::{CallbackAction, ConversationDirectory};

/// Bridge gateway managing the relay tasks.
pub struct BridgeGateway {
    pub(crate) control: Arc<dyn ControlChannel>,
    pub(crate) source: Arc<dyn SourcePlatform>,
    pub(crate) settings: BridgeSettings,
    pub(crate) router: Arc<SessionRouter>,
    pub(crate) directory: Arc<RwLock<ConversationDirectory>>,
    pub(crate) picker: Arc<PickerController>,
    pub(crate) outbound: Arc<OutboundRelay>,
    pub(crate) status: Arc<RwLock<GatewayStatus>>,
    pub(crate) cancel_token: CancellationToken,
}

/// Everything the dispatch loop needs to handle one control event.
#[derive(Clone)]
pub(crate) struct DispatchContext {
    control: Arc<dyn ControlChannel>,
    router: Arc<SessionRouter>,
    picker: Arc<PickerController>,
    outbound: Arc<OutboundRelay>,
    status: Arc<RwLock<GatewayStatus>>,
}

impl BridgeGateway {
    pub fn new(
        control: Arc<dyn ControlChannel>,
        source: Arc<dyn SourcePlatform>,
        settings: BridgeSettings,
    ) -> Self {
        let router = Arc::new(SessionRouter::new());
        let directory = Arc::new(RwLock::new(ConversationDirectory::new()));
        let picker = Arc::new(PickerController::new(
            source.clone(),
            control.clone(),
            router.clone(),
            directory.clone(),
            settings.page_size,
        ));
        let outbound = Arc::new(OutboundRelay::new(
            source.clone(),
            control.clone(),
            router.clone(),
        ));

        Self {
            control,
            source,
            settings,
            router,
            directory,
            picker,
            outbound,
            status: Arc::new(RwLock::new(GatewayStatus::default())),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Shared session handle.
    pub fn session_router(&self) -> Arc<SessionRouter> {
        self.router.clone()
    }

    /// Get current gateway status.
    pub async fn get_status(&self) -> GatewayStatus {
        let mut status = self.status.read().await.clone();
        status.active_conversation = self
            .router
            .active_conversation()
            .await
            .map(|active| format!("{} ({})", active.name, active.id));
        status
    }

    /// Start the control dispatch loop and the inbound relay.
    ///
    /// The conversation directory is filled before the relay starts so
    /// inbound messages carry real names. A stopped gateway cannot be
    /// restarted.
    pub async fn start(&self) -> Result<(), BridgeError> {
        if self.cancel_token.is_cancelled() {
            return Err(BridgeError::Stopped);
        }

        // Held until running is set, so concurrent starts spawn only once
        let mut status = self.status.write().await;
        if status.running {
            return Err(BridgeError::AlreadyRunning);
        }

        match self.source.list_conversations().await {
            Ok(listing) => {
                tracing::debug!(count = listing.len(), "conversation directory loaded");
                self.directory.write().await.replace(listing);
            }
            Err(e) => {
                tracing::warn!("Failed to load conversations, names fall back to ids: {}", e);
            }
        }

        let (tx, mut rx) = mpsc::channel::<ControlEvent>(100);
        self.control.start(tx).await?;

        let context = DispatchContext {
            control: self.control.clone(),
            router: self.router.clone(),
            picker: self.picker.clone(),
            outbound: self.outbound.clone(),
            status: self.status.clone(),
        };
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(event) = rx.recv() => context.handle_event(event).await,
                    else => break,
                }
            }
            tracing::debug!("control dispatch loop stopped");
        });

        let inbound = InboundRelay {
            source: self.source.clone(),
            control: self.control.clone(),
            router: self.router.clone(),
            directory: self.directory.clone(),
            status: self.status.clone(),
            relay_outgoing: self.settings.relay_outgoing,
            reconnect: self.settings.reconnect.clone(),
        };
        tokio::spawn(inbound.run(self.cancel_token.clone()));

        status.running = true;
        status.connected_since = Some(chrono::Utc::now().to_rfc3339());
        status.error = None;

        tracing::info!("bridge gateway started");
        Ok(())
    }

    /// Stop both tasks and the control channel.
    pub async fn stop(&self) -> Result<(), BridgeError> {
        self.cancel_token.cancel();
        self.control.stop().await?;

        let mut status = self.status.write().await;
        status.running = false;
        status.connected_since = None;

        tracing::info!("bridge gateway stopped");
        Ok(())
    }
}

impl DispatchContext {
    /// Handle one control event. Errors are logged, never propagated.
    pub(crate) async fn handle_event(&self, event: ControlEvent) {
        let result = match event {
            ControlEvent::Text { text, .. } => self.handle_text(&text).await,
            ControlEvent::ButtonPress {
                message_id,
                payload,
            } => {
                let action = CallbackAction::decode(&payload);
                tracing::debug!(kind = action.kind(), message_id, "button press");
                self.picker.handle_action(message_id, action).await
            }
        };

        if let Err(e) = result {
            tracing::warn!("Failed to handle control event: {}", e);
        }
    }

    async fn handle_text(&self, text: &str) -> Result<(), BridgeError> {
        let command = CommandRouter::parse(text);
        tracing::debug!(command = command_type_name(&command), "control command");

        match command {
            ControlCommand::Now => {
                self.router.clear_awaiting_reply().await;
                let description = self.router.describe_active().await;
                self.control.send_text(&description).await?;
            }
            ControlCommand::Chats => {
                self.router.clear_awaiting_reply().await;
                self.picker.open().await?;
            }
            ControlCommand::Help => {
                self.control.send_text(HELP_TEXT).await?;
            }
            ControlCommand::Unknown { name } => {
                tracing::debug!(command = %name, "ignoring unknown command");
            }
            ControlCommand::Relay { text } => {
                if let OutboundOutcome::Delivered { .. } = self.outbound.handle_text(&text).await? {
                    self.status.write().await.outbound_relayed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Command name for logging.
fn command_type_name(command: &ControlCommand) -> &'static str {
    match command {
        ControlCommand::Now => "Now",
        ControlCommand::Chats => "Chats",
        ControlCommand::Help => "Help",
        ControlCommand::Relay { .. } => "Relay",
        ControlCommand::Unknown { .. } => "Unknown",
    }
}
