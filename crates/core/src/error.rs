//! Core Error Types
//!
//! Error types shared across the bridge workspace. Kept dependency-free
//! (thiserror + std only) so the core crate stays lightweight.
//!
//! The application crate defines `BridgeError` for platform transport
//! failures and `AppError` for startup failures.

use thiserror::Error;

/// Core error type for the bridge workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Validation errors (e.g. a codec field containing the delimiter)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parse errors (e.g. a non-numeric action parameter)
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
