//! Error types for the relay module.
//!
//! These only ever describe a single connection. The relay converts them
//! into per-target result codes and never lets them escape a fan-out.

use thiserror::Error;

/// Errors that can occur while talking to one connection.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The call or its reply could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] tether_core::CoreError),

    /// The peer went away before answering.
    #[error("peer closed the connection")]
    PeerClosed,

    /// Store operation failed.
    #[error("store error: {0}")]
    StoreError(#[from] tether_store::StoreError),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
