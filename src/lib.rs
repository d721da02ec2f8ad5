//! VK Telegram Bridge
//!
//! Read and answer VK conversations from a single Telegram chat.
//! It includes:
//! - Platform adapters (VK long-poll API, Telegram bot)
//! - Session routing, conversation picker and message relays
//! - Environment configuration and error types

pub mod config;
pub mod services;
pub mod utils;

pub use config::BridgeConfig;
pub use services::bridge::{BridgeError, BridgeGateway, SessionRouter};
pub use utils::{AppError, AppResult};
