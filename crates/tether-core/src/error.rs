//! Error types for Tether Core.

use thiserror::Error;

/// Core errors: identifier validation and wire encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid friend code: {0}")]
    InvalidFriendCode(String),

    #[error("unknown action kind: {0:#06x}")]
    UnknownActionKind(u16),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
