//! VK Telegram Bridge Core
//!
//! Platform-independent building blocks of the bridge: the button action
//! codec, the conversation directory and the core error types. This crate
//! knows nothing about Telegram, VK, HTTP or the async runtime.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `action` - Button payload codec (`ActionCodec`, `CallbackAction`)
//! - `conversation` - Conversation model and paginated directory

pub mod action;
pub mod conversation;
pub mod error;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Action Codec ───────────────────────────────────────────────────────
pub use action::{ActionCodec, CallbackAction, RawAction, MAX_CALLBACK_BYTES};

// ── Conversation Directory ─────────────────────────────────────────────
pub use conversation::{
    fallback_name, Conversation, ConversationDirectory, ConversationKind, ConversationPage,
};
