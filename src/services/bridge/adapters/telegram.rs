//! Telegram Adapter
//!
//! Control channel implemented as a Telegram bot using teloxide long-polling.
//! Accepts events only from the configured control chat, acknowledges button
//! presses on receipt, and splits messages for Telegram's 4096 character limit.

use super::ControlChannel;
use crate::services::bridge::types::{
    BridgeError, ControlEvent, Keyboard, TelegramAdapterConfig,
};
use async_trait::async_trait;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Telegram Bot adapter using teloxide with long-polling.
pub struct TelegramAdapter {
    pub(crate) config: TelegramAdapterConfig,
    pub(crate) bot: teloxide::Bot,
    pub(crate) cancel_token: CancellationToken,
}

impl TelegramAdapter {
    /// Create a new Telegram adapter.
    pub fn new(config: TelegramAdapterConfig) -> Result<Self, BridgeError> {
        let bot_token = config
            .bot_token
            .as_ref()
            .ok_or_else(|| BridgeError::ConfigError("Bot token is required".to_string()))?;

        let bot = teloxide::Bot::new(bot_token);

        Ok(Self {
            config,
            bot,
            cancel_token: CancellationToken::new(),
        })
    }

    fn chat_id(&self) -> teloxide::types::ChatId {
        teloxide::types::ChatId(self.config.control_chat_id)
    }
}

/// Split long messages at line boundaries to respect platform limits.
///
/// Limits are counted in characters so multi-byte text is never cut inside
/// a character.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len || max_len == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            // Handle single lines longer than max_len
            if line_len > max_len {
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(max_len) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Convert a bridge keyboard into Telegram inline markup.
pub(crate) fn to_inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.payload.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl ControlChannel for TelegramAdapter {
    async fn start(&self, event_tx: mpsc::Sender<ControlEvent>) -> Result<(), BridgeError> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::prelude::*;
        use teloxide::types::{CallbackQuery, Message, Update};

        let bot = self.bot.clone();
        let control_chat_id = self.config.control_chat_id;
        let message_tx = event_tx.clone();
        let button_tx = event_tx;
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        // Authorization check: only the control chat is served
                        if msg.chat.id.0 != control_chat_id {
                            tracing::debug!(chat_id = msg.chat.id.0, "ignoring message from foreign chat");
                            return Ok::<(), HandlerError>(());
                        }

                        if let Some(text) = msg.text() {
                            let event = ControlEvent::Text {
                                message_id: msg.id.0 as i64,
                                text: text.to_string(),
                            };
                            if tx.send(event).await.is_err() {
                                tracing::debug!("control event channel closed");
                            }
                        }
                        Ok(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |bot: Bot, query: CallbackQuery| {
                        let tx = button_tx.clone();
                        async move {
                            // Acknowledge before anything else
                            if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                                tracing::warn!("Failed to acknowledge button press: {}", e);
                            }

                            let Some(message) = query.regular_message() else {
                                return Ok::<(), HandlerError>(());
                            };
                            if message.chat.id.0 != control_chat_id {
                                tracing::debug!(
                                    chat_id = message.chat.id.0,
                                    "ignoring button press from foreign chat"
                                );
                                return Ok(());
                            }
                            let Some(payload) = query.data.clone() else {
                                return Ok(());
                            };

                            let event = ControlEvent::ButtonPress {
                                message_id: message.id.0 as i64,
                                payload,
                            };
                            if tx.send(event).await.is_err() {
                                tracing::debug!("control event channel closed");
                            }
                            Ok(())
                        }
                    },
                ));

            let mut dispatcher = Dispatcher::builder(bot, handler).build();

            // Get shutdown token for graceful termination
            let shutdown_token = dispatcher.shutdown_token();

            // Trigger dispatcher shutdown when the adapter is stopped
            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                cancel_clone.cancelled().await;
                if let Ok(shutdown) = shutdown_token.shutdown() {
                    shutdown.await;
                }
            });

            tracing::info!("Telegram dispatcher started");
            dispatcher.dispatch().await;
            tracing::info!("Telegram dispatcher stopped");
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<i64, BridgeError> {
        use teloxide::prelude::*;

        let mut last_id = 0;
        for chunk in split_message(text, self.config.max_message_length) {
            let message = self
                .bot
                .send_message(self.chat_id(), chunk)
                .await
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
            last_id = message.id.0 as i64;
        }
        Ok(last_id)
    }

    async fn reply_text(&self, reply_to: i64, text: &str) -> Result<i64, BridgeError> {
        use teloxide::prelude::*;
        use teloxide::types::{MessageId, ReplyParameters};

        let mut last_id = 0;
        for (index, chunk) in split_message(text, self.config.max_message_length)
            .into_iter()
            .enumerate()
        {
            let request = self.bot.send_message(self.chat_id(), chunk);
            // Only the first chunk is threaded
            let request = if index == 0 {
                request.reply_parameters(ReplyParameters::new(MessageId(reply_to as i32)))
            } else {
                request
            };
            let message = request
                .await
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
            last_id = message.id.0 as i64;
        }
        Ok(last_id)
    }

    async fn send_keyboard(&self, text: &str, keyboard: &Keyboard) -> Result<i64, BridgeError> {
        use teloxide::prelude::*;

        let mut chunks = split_message(text, self.config.max_message_length);
        let last = chunks.pop().unwrap_or_default();
        for chunk in chunks {
            self.bot
                .send_message(self.chat_id(), chunk)
                .await
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        }

        // Keyboard rides on the final chunk
        let message = self
            .bot
            .send_message(self.chat_id(), last)
            .reply_markup(to_inline_markup(keyboard))
            .await
            .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        Ok(message.id.0 as i64)
    }

    async fn edit_keyboard(
        &self,
        message_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), BridgeError> {
        use teloxide::prelude::*;
        use teloxide::types::MessageId;
        use teloxide::{ApiError, RequestError};

        let result = self
            .bot
            .edit_message_text(self.chat_id(), MessageId(message_id as i32), text)
            .reply_markup(to_inline_markup(keyboard))
            .await;

        match result {
            Ok(_) => Ok(()),
            // Re-rendering a clamped page yields identical content
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(BridgeError::SendFailed(e.to_string())),
        }
    }

    async fn pin_message(&self, message_id: i64) -> Result<(), BridgeError> {
        use teloxide::prelude::*;
        use teloxide::types::MessageId;

        self.bot
            .pin_chat_message(self.chat_id(), MessageId(message_id as i32))
            .disable_notification(true)
            .await
            .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), BridgeError> {
        use teloxide::prelude::*;

        self.bot
            .get_me()
            .await
            .map_err(|e| BridgeError::ConfigError(format!("Bot health check failed: {}", e)))?;
        Ok(())
    }
}
