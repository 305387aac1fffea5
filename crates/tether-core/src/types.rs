//! Strong type definitions for Tether.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::limits::MAX_FRIEND_CODE_LEN;
use crate::error::{CoreError, Result};

/// An opaque, unique account identifier.
///
/// Friend codes are the identity key for presence, permissions and
/// possession sessions. They are compared byte-for-byte; no normalization
/// is applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendCode(String);

impl FriendCode {
    /// Create a friend code, rejecting empty or oversized values.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if !Self::is_valid(&code) {
            return Err(CoreError::InvalidFriendCode(code));
        }
        Ok(Self(code))
    }

    /// Generate a random friend code (16 upper-case hex digits).
    pub fn random() -> Self {
        use rand::Rng;
        let bytes: [u8; 8] = rand::thread_rng().gen();
        Self(hex::encode_upper(bytes))
    }

    /// Check whether a raw string would make a well-formed friend code.
    pub fn is_valid(code: &str) -> bool {
        !code.is_empty()
            && code.len() <= MAX_FRIEND_CODE_LEN
            && !code.chars().any(char::is_control)
    }

    /// Check a code that arrived through deserialization, which bypasses [`FriendCode::new`].
    pub fn is_well_formed(&self) -> bool {
        Self::is_valid(&self.0)
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the code, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for FriendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FriendCode({})", self.0)
    }
}

impl fmt::Display for FriendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FriendCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FriendCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for FriendCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for FriendCode {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
