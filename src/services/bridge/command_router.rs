//! Command Router
//!
//! Parses control-chat text into [`ControlCommand`] variants.

use super::types::ControlCommand;

/// Stateless command parser for control-chat messages.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse incoming message text into a ControlCommand.
    ///
    /// - `/now` -> Now
    /// - `/chats` -> Chats
    /// - `/help`, `/start` -> Help
    /// - any other `/command` -> Unknown
    /// - plain text -> Relay, verbatim
    ///
    /// Commands may carry a `@botname` suffix as Telegram sends them in
    /// groups. Trailing arguments are ignored.
    pub fn parse(text: &str) -> ControlCommand {
        let trimmed = text.trim();

        let Some(command) = trimmed.strip_prefix('/') else {
            return ControlCommand::Relay {
                text: text.to_string(),
            };
        };

        let word = command.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();

        match name {
            "now" => ControlCommand::Now,
            "chats" => ControlCommand::Chats,
            "help" | "start" => ControlCommand::Help,
            _ => ControlCommand::Unknown {
                name: name.to_string(),
            },
        }
    }
}

/// Help text displayed for /help and /start
pub const HELP_TEXT: &str = r#"VK Bridge

Every new VK message is forwarded here. Press Reply under a message,
or pick a chat with /chats, then just type to answer.

Available commands:
  /chats  -- Pick the conversation to talk to
  /now    -- Show the current conversation
  /help   -- Show this help
"#;
