//! Error Handling
//!
//! Application-level error type for startup and configuration.
//! Uses thiserror for ergonomic error definitions.

use crate::services::bridge::BridgeError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bridge errors (auto-converted from BridgeError)
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
