//! Error types for the Hub.
//!
//! Only account and friend-list management can fail. Relaying never does:
//! its outcomes are result codes.

use tether_core::FriendCode;
use tether_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Malformed friend code.
    #[error("invalid friend code: {0}")]
    InvalidFriendCode(String),

    /// No account with this friend code.
    #[error("unknown account: {0}")]
    UnknownAccount(FriendCode),

    /// The edge already exists.
    #[error("{owner} has already added {friend}")]
    AlreadyFriends { owner: FriendCode, friend: FriendCode },

    /// The edge does not exist.
    #[error("{owner} has not added {friend}")]
    NotFriends { owner: FriendCode, friend: FriendCode },

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for Hub operations.
pub type Result<T> = std::result::Result<T, HubError>;
