//! Platform Adapters
//!
//! Trait definitions for the two platforms the bridge connects, plus their
//! implementations. The relay and picker logic only ever talks to these
//! traits.

pub mod telegram;
pub mod vk;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vk_tg_bridge_core::Conversation;

use super::types::{BridgeError, ControlEvent, Keyboard, RenderedMessage, SourceEvent};

/// Operator-facing control chat.
///
/// Every method targets the single configured control chat. Message ids are
/// the platform's ids of the messages the bridge sent.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Start receiving events from the control chat.
    ///
    /// Text messages and button presses are forwarded through the provided
    /// channel. Button presses are acknowledged by the adapter on receipt.
    /// The adapter spawns its own task for the receive loop.
    async fn start(&self, event_tx: mpsc::Sender<ControlEvent>) -> Result<(), BridgeError>;

    /// Stop receiving events.
    async fn stop(&self) -> Result<(), BridgeError>;

    /// Send plain text, split as needed. Returns the id of the last message sent.
    async fn send_text(&self, text: &str) -> Result<i64, BridgeError>;

    /// Send plain text as a reply threaded to `reply_to`. Returns the id of
    /// the last message sent.
    async fn reply_text(&self, reply_to: i64, text: &str) -> Result<i64, BridgeError>;

    /// Send text with an inline keyboard. Returns the id of the keyboard message.
    async fn send_keyboard(&self, text: &str, keyboard: &Keyboard) -> Result<i64, BridgeError>;

    /// Replace the text and keyboard of a message sent earlier.
    async fn edit_keyboard(
        &self,
        message_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), BridgeError>;

    /// Pin a message at the top of the control chat.
    async fn pin_message(&self, message_id: i64) -> Result<(), BridgeError>;

    /// Check connectivity and credentials.
    async fn health_check(&self) -> Result<(), BridgeError>;

    /// Send a rendered message, with or without keyboard.
    async fn send_rendered(&self, message: &RenderedMessage) -> Result<i64, BridgeError> {
        match &message.keyboard {
            Some(keyboard) => self.send_keyboard(&message.text, keyboard).await,
            None => self.send_text(&message.text).await,
        }
    }
}

/// The messaging service whose conversations are bridged.
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Wait for and return the next batch of events.
    ///
    /// May block for the platform's long-poll window and may return an empty
    /// batch. Each call continues where the previous one stopped.
    async fn poll_events(&self) -> Result<Vec<SourceEvent>, BridgeError>;

    /// Send text to a conversation.
    async fn send_message(&self, peer_id: i64, text: &str) -> Result<(), BridgeError>;

    /// Current conversations, most recent first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, BridgeError>;
}
