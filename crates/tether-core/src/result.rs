//! Result codes for relayed actions.
//!
//! Two layers: [`ActionResultEc`] describes what happened to one target,
//! [`ActionResponseEc`] describes whether the relay ran at all. A request in
//! which every target was denied still has an overall code of `Success`.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::FriendCode;

/// Outcome code for exactly one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionResultEc {
    Success,
    TargetOffline,
    TargetNotFriends,
    TargetHasNotGrantedSenderPermissions,
    TargetTimeout,
    Unknown,
    AlreadyBeingPossessedOrPossessing,
    PossessionDesynchronization,
}

/// Request-level outcome code, decided before any per-target work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionResponseEc {
    Success,
    /// The sender has no live connection.
    SenderNotConnected,
    /// Malformed target list or oversized payload.
    BadDataInRequest,
    /// The sender is still inside its own cooldown.
    TooManyRequests,
}

/// Outcome for one target, with the value the target returned, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub code: ActionResultEc,
    pub value: Option<Bytes>,
}

impl ActionResult {
    /// A result carrying only a code.
    pub fn code(code: ActionResultEc) -> Self {
        Self { code, value: None }
    }

    /// A successful result without a value.
    pub fn success() -> Self {
        Self::code(ActionResultEc::Success)
    }

    /// A successful result carrying the target's returned value.
    pub fn success_with(value: impl Into<Bytes>) -> Self {
        Self {
            code: ActionResultEc::Success,
            value: Some(value.into()),
        }
    }

    /// Check if this result is a success.
    pub fn is_success(&self) -> bool {
        self.code == ActionResultEc::Success
    }
}

impl From<ActionResultEc> for ActionResult {
    fn from(code: ActionResultEc) -> Self {
        Self::code(code)
    }
}

/// The full multi-target outcome returned to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub code: ActionResponseEc,
    pub results: HashMap<FriendCode, ActionResult>,
}

impl ActionResponse {
    /// A request-level rejection with no per-target results.
    pub fn rejected(code: ActionResponseEc) -> Self {
        Self {
            code,
            results: HashMap::new(),
        }
    }

    /// A successful relay carrying per-target results.
    pub fn success(results: HashMap<FriendCode, ActionResult>) -> Self {
        Self {
            code: ActionResponseEc::Success,
            results,
        }
    }

    /// The result code recorded for a target, if the target was part of the request.
    pub fn code_for(&self, target: &FriendCode) -> Option<ActionResultEc> {
        self.results.get(target).map(|result| result.code)
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        crate::codec::encode(self)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        crate::codec::decode(bytes)
    }
}
