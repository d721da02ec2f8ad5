//! Response Mapper
//!
//! Every piece of operator-facing text the bridge sends to the control chat.

use super::session_router::ActiveConversation;
use super::types::{BridgeError, GatewayStatus, Keyboard, KeyboardButton, RenderedMessage};
use vk_tg_bridge_core::{CallbackAction, ConversationPage, CoreResult, MAX_CALLBACK_BYTES};

/// Reply when there is no active conversation.
pub const NO_CHAT_SELECTED: &str = "No chat selected";

/// Picker text when the listing is empty.
pub const NO_CHATS_FOUND: &str = "No chats found";

/// Label of the button attached to relayed messages.
pub const REPLY_LABEL: &str = "Reply";

/// Longest conversation name shown on a picker button.
const MAX_BUTTON_LABEL: usize = 48;

/// Formatter for control-chat display.
pub struct ResponseMapper;

impl ResponseMapper {
    /// Confirmation sent (and pinned) after selecting a conversation.
    pub fn format_now_talking(name: &str) -> String {
        format!("Now talking with {}", name)
    }

    /// Description of the current binding, used by `/now`.
    pub fn describe(active: Option<&ActiveConversation>) -> String {
        match active {
            Some(active) => Self::format_now_talking(&active.name),
            None => NO_CHAT_SELECTED.to_string(),
        }
    }

    /// Relayed message body with its sender header.
    pub fn format_inbound(name: &str, text: &str) -> String {
        format!("{}:\n{}", name, Self::body_or_placeholder(text))
    }

    /// Render a relayed message.
    ///
    /// Continuations of an unanswered run are sent bare.
    pub fn render_inbound(
        conversation_id: i64,
        name: &str,
        text: &str,
        continuation: bool,
    ) -> CoreResult<RenderedMessage> {
        if continuation {
            return Ok(RenderedMessage::plain(Self::body_or_placeholder(text)));
        }

        let payload = CallbackAction::Answer {
            conversation_id,
            name: name.to_string(),
        }
        .to_payload_bounded(MAX_CALLBACK_BYTES)?;

        Ok(RenderedMessage::with_keyboard(
            Self::format_inbound(name, text),
            Keyboard::single(KeyboardButton::new(REPLY_LABEL, payload)),
        ))
    }

    /// Picker message header.
    pub fn format_picker_header(page: &ConversationPage) -> String {
        if page.is_empty() {
            NO_CHATS_FOUND.to_string()
        } else {
            format!("Chats (page {}/{})", page.index + 1, page.total)
        }
    }

    /// Button label for one conversation.
    pub fn button_label(name: &str) -> String {
        Self::truncate(name, MAX_BUTTON_LABEL)
    }

    /// Reply sent when an outbound message could not be delivered.
    pub fn format_delivery_failure(error: &BridgeError) -> String {
        format!("Failed to deliver message: {}", error)
    }

    /// Gateway status summary.
    pub fn format_status(status: &GatewayStatus) -> String {
        format!(
            "Gateway: {}\nActive: {}\nRelayed in/out: {}/{}",
            if status.running { "Running" } else { "Stopped" },
            status
                .active_conversation
                .as_deref()
                .unwrap_or(NO_CHAT_SELECTED),
            status.inbound_relayed,
            status.outbound_relayed
        )
    }

    /// Truncate to `max_chars` characters, marking the cut with an ellipsis.
    pub fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        if max_chars <= 3 {
            return "...".to_string();
        }
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }

    fn body_or_placeholder(text: &str) -> &str {
        if text.is_empty() {
            "(no text)"
        } else {
            text
        }
    }
}
