//! Action Codec
//!
//! Compact string protocol carried by inline-keyboard button presses.
//! Every button is rendered with an encoded payload and decoded once when
//! pressed.
//!
//! ## Wire Format
//!
//! ```text
//! <command>.<param>.<rest>
//! answer.100.Alice        -> select conversation 100 ("Alice")
//! answer.7.Dr. Who        -> the name keeps its own delimiters
//! chat.2.nav              -> show picker page 2
//! ```
//!
//! Only the first two delimiters are structural; the trailing field may
//! contain any number of `.` characters.

use crate::error::{CoreError, CoreResult};

/// Field delimiter of the wire format.
pub const DELIMITER: char = '.';

/// Maximum payload size Telegram accepts in `callback_data`.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// Command selecting a conversation as the active destination.
pub const ANSWER_COMMAND: &str = "answer";

/// Command navigating the conversation picker.
pub const CHAT_COMMAND: &str = "chat";

/// Trailing tag carried by navigation payloads.
pub const NAV_TAG: &str = "nav";

/// Stateless encoder/decoder for the raw wire format.
pub struct ActionCodec;

impl ActionCodec {
    /// Encode a command and up to two parameters.
    ///
    /// The command and every parameter except the last must not contain the
    /// delimiter, otherwise the payload could not be split back apart.
    pub fn encode<S: AsRef<str>>(command: &str, params: &[S]) -> CoreResult<String> {
        if command.is_empty() {
            return Err(CoreError::validation("command must not be empty"));
        }
        if command.contains(DELIMITER) {
            return Err(CoreError::validation(format!(
                "command '{}' must not contain '{}'",
                command, DELIMITER
            )));
        }
        if params.len() > 2 {
            return Err(CoreError::validation(format!(
                "at most 2 parameters are supported, got {}",
                params.len()
            )));
        }

        let mut payload = command.to_string();
        for (i, param) in params.iter().enumerate() {
            let param = param.as_ref();
            if i + 1 < params.len() && param.contains(DELIMITER) {
                return Err(CoreError::validation(format!(
                    "parameter '{}' must not contain '{}'",
                    param, DELIMITER
                )));
            }
            payload.push(DELIMITER);
            payload.push_str(param);
        }
        Ok(payload)
    }

    /// Split a raw payload into at most three fields.
    pub fn split(raw: &str) -> RawAction {
        let mut fields = raw.splitn(3, DELIMITER);
        RawAction {
            command: fields.next().unwrap_or_default().to_string(),
            param: fields.next().map(str::to_string),
            rest: fields.next().map(str::to_string),
        }
    }
}

/// A payload split into its structural fields, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAction {
    pub command: String,
    pub param: Option<String>,
    pub rest: Option<String>,
}

impl RawAction {
    /// Interpret the first parameter as an integer.
    pub fn int_param(&self) -> CoreResult<i64> {
        let param = self
            .param
            .as_deref()
            .ok_or_else(|| CoreError::parse(format!("'{}' has no parameter", self.command)))?;
        param
            .parse::<i64>()
            .map_err(|e| CoreError::parse(format!("expected integer, got '{}': {}", param, e)))
    }
}

/// Decoded button action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `answer.<id>.<name>` - bind the conversation as the active destination
    Answer { conversation_id: i64, name: String },
    /// `chat.<index>.nav` - re-render the picker at a page
    ChatPage { index: i64 },
    /// Anything else, kept verbatim for logging
    Unrecognized { raw: String },
}

impl CallbackAction {
    /// Decode a payload. Never fails: unknown commands and malformed
    /// parameters decode to [`CallbackAction::Unrecognized`].
    pub fn decode(raw: &str) -> Self {
        let action = ActionCodec::split(raw);
        let decoded = match action.command.as_str() {
            ANSWER_COMMAND => action.int_param().map(|conversation_id| Self::Answer {
                conversation_id,
                name: action.rest.clone().unwrap_or_default(),
            }),
            CHAT_COMMAND => action.int_param().map(|index| Self::ChatPage { index }),
            other => Err(CoreError::parse(format!("unknown command '{}'", other))),
        };
        decoded.unwrap_or_else(|_| Self::Unrecognized {
            raw: raw.to_string(),
        })
    }

    /// Encode back into the wire format.
    pub fn to_payload(&self) -> CoreResult<String> {
        match self {
            Self::Answer {
                conversation_id,
                name,
            } => ActionCodec::encode(ANSWER_COMMAND, &[conversation_id.to_string(), name.clone()]),
            Self::ChatPage { index } => {
                ActionCodec::encode(CHAT_COMMAND, &[index.to_string(), NAV_TAG.to_string()])
            }
            Self::Unrecognized { raw } => Ok(raw.clone()),
        }
    }

    /// Encode, truncating the trailing name so the payload fits `max_bytes`.
    ///
    /// Only `Answer` payloads carry free text, so they are the only ones that
    /// can be shortened.
    pub fn to_payload_bounded(&self, max_bytes: usize) -> CoreResult<String> {
        let payload = self.to_payload()?;
        if payload.len() <= max_bytes {
            return Ok(payload);
        }

        match self {
            Self::Answer {
                conversation_id,
                name,
            } => {
                let head = format!(
                    "{}{}{}{}",
                    ANSWER_COMMAND, DELIMITER, conversation_id, DELIMITER
                );
                if head.len() > max_bytes {
                    return Err(CoreError::validation(format!(
                        "payload head '{}' exceeds {} bytes",
                        head, max_bytes
                    )));
                }
                let name = truncate_to_bytes(name, max_bytes - head.len());
                Ok(format!("{}{}", head, name))
            }
            _ => Err(CoreError::validation(format!(
                "payload exceeds {} bytes",
                max_bytes
            ))),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answer { .. } => "Answer",
            Self::ChatPage { .. } => "ChatPage",
            Self::Unrecognized { .. } => "Unrecognized",
        }
    }
}

/// Cut a string to at most `max` bytes without splitting a character.
fn truncate_to_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
