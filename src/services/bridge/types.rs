//! Bridge Types
//!
//! Core types for the bridge gateway including adapter configuration,
//! control-chat events and commands, Source Platform events, keyboards,
//! status tracking, and error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use vk_tg_bridge_core::CoreError;

// ---------------------------------------------------------------------------
// Adapter & Configuration Types
// ---------------------------------------------------------------------------

/// Telegram-specific configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramAdapterConfig {
    #[serde(skip_serializing, default)]
    pub bot_token: Option<String>,
    /// The single operator-facing chat. Events from any other chat are dropped.
    pub control_chat_id: i64,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

fn default_max_message_length() -> usize {
    4000
}

impl Default for TelegramAdapterConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            control_chat_id: 0,
            max_message_length: default_max_message_length(),
        }
    }
}

impl fmt::Debug for TelegramAdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramAdapterConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("control_chat_id", &self.control_chat_id)
            .field("max_message_length", &self.max_message_length)
            .finish()
    }
}

/// VK-specific configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct VkAdapterConfig {
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    #[serde(default = "default_vk_api_version")]
    pub api_version: String,
    #[serde(default = "default_vk_api_base_url")]
    pub api_base_url: String,
    /// Seconds the long-poll server may hold a request open
    #[serde(default = "default_longpoll_wait_secs")]
    pub longpoll_wait_secs: u64,
}

fn default_vk_api_version() -> String {
    "5.131".to_string()
}

fn default_vk_api_base_url() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_longpoll_wait_secs() -> u64 {
    25
}

impl Default for VkAdapterConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_version: default_vk_api_version(),
            api_base_url: default_vk_api_base_url(),
            longpoll_wait_secs: default_longpoll_wait_secs(),
        }
    }
}

impl fmt::Debug for VkAdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VkAdapterConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("api_base_url", &self.api_base_url)
            .field("longpoll_wait_secs", &self.longpoll_wait_secs)
            .finish()
    }
}

/// Relay and picker behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Conversations per picker page
    pub page_size: usize,
    /// Relay messages the VK account sent itself
    pub relay_outgoing: bool,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            page_size: 8,
            relay_outgoing: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Backoff applied between failed Source Platform polls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Base delay in milliseconds for exponential backoff (default: 1000)
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (default: 30000)
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 30000,
        }
    }
}

impl ReconnectConfig {
    /// Calculate the delay for a given consecutive failure using exponential backoff.
    ///
    /// Formula: `min(2^attempt * base_delay_ms, max_delay_ms)`
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        delay.min(self.max_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Control Channel Types
// ---------------------------------------------------------------------------

/// Command parsed from control chat text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// /now - Show the active conversation
    Now,
    /// /chats - Open the conversation picker
    Chats,
    /// /help or /start - Show available commands
    Help,
    /// Plain text - Relay to the active conversation
    Relay { text: String },
    /// Any other slash command - ignored
    Unknown { name: String },
}

/// Event received from the control chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// A text message typed by the operator
    Text { message_id: i64, text: String },
    /// An inline-keyboard button press carrying an action payload
    ButtonPress { message_id: i64, payload: String },
}

/// A single inline-keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub label: String,
    pub payload: String,
}

impl KeyboardButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Inline keyboard, row by row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<KeyboardButton>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard with a single button
    pub fn single(button: KeyboardButton) -> Self {
        Self {
            rows: vec![vec![button]],
        }
    }

    /// Append a row; empty rows are skipped.
    pub fn push_row(&mut self, row: Vec<KeyboardButton>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &KeyboardButton> {
        self.rows.iter().flatten()
    }
}

/// Text plus optional keyboard, ready to hand to the control channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl RenderedMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

// ---------------------------------------------------------------------------
// Source Platform Types
// ---------------------------------------------------------------------------

/// A new message observed on the Source Platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub message_id: i64,
    pub peer_id: i64,
    pub text: String,
    /// Sent by the bridged account itself
    pub outgoing: bool,
    pub timestamp: i64,
}

/// Typed event from one Source Platform update batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    NewMessage(SourceMessage),
    /// Any other event kind, identified by its platform code
    Other { code: i64 },
}

// ---------------------------------------------------------------------------
// Status Types
// ---------------------------------------------------------------------------

/// Gateway runtime status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub running: bool,
    pub connected_since: Option<String>,
    /// Active conversation as "name (id)"
    #[serde(default)]
    pub active_conversation: Option<String>,
    pub total_events_processed: u64,
    pub inbound_relayed: u64,
    pub outbound_relayed: u64,
    pub last_event_at: Option<String>,
    /// Consecutive failed Source Platform polls
    #[serde(default)]
    pub poll_failures: u32,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// Bridge error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("Bridge gateway is already running")]
    AlreadyRunning,

    #[error("Bridge gateway has been stopped")]
    Stopped,

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<CoreError> for BridgeError {
    fn from(err: CoreError) -> Self {
        BridgeError::Codec(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
