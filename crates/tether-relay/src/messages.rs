//! Relay message types.
//!
//! `ActionRequest` is what a sender submits; `ForwardedCall` is what a target
//! receives once the request has been authorized.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use tether_core::{decode, encode, ActionKind, FriendCode};
use tether_perms::PermissionSet;

/// An action a sender wants performed on one or more targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Who the action is aimed at. Duplicates are collapsed by the relay.
    pub targets: Vec<FriendCode>,
    /// What the action is.
    pub kind: ActionKind,
    /// Opaque action payload, forwarded untouched.
    pub payload: Bytes,
    /// Extra permissions beyond the kind's floor (e.g. a chat channel).
    #[serde(default)]
    pub required: PermissionSet,
}

impl ActionRequest {
    /// Create a request with no extra requirements.
    pub fn new(kind: ActionKind, targets: Vec<FriendCode>, payload: impl Into<Bytes>) -> Self {
        Self {
            targets,
            kind,
            payload: payload.into(),
            required: PermissionSet::NONE,
        }
    }

    /// Add extra required permissions.
    pub fn with_required(mut self, required: PermissionSet) -> Self {
        self.required = self.required.union(&required);
        self
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> tether_core::Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from the wire.
    pub fn from_bytes(bytes: &[u8]) -> tether_core::Result<Self> {
        decode(bytes)
    }
}

/// Camera control frame sent by a ghost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub horizontal_rotation: f32,
    pub vertical_rotation: f32,
    pub zoom: f32,
}

/// Movement control frame sent by a ghost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFrame {
    pub horizontal: f32,
    pub vertical: f32,
    pub turn: f32,
    pub walking: bool,
}

/// A control update queued on a possession session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PossessionUpdate {
    Camera(CameraFrame),
    Movement(MovementFrame),
}

impl PossessionUpdate {
    /// The call the host receives for this update.
    pub fn into_call(self, ghost: FriendCode) -> ForwardedCall {
        match self {
            PossessionUpdate::Camera(frame) => ForwardedCall::PossessionCamera { ghost, frame },
            PossessionUpdate::Movement(frame) => ForwardedCall::PossessionMovement { ghost, frame },
        }
    }
}

/// Calls delivered to a target's connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForwardedCall {
    /// Perform an action on behalf of `sender`.
    Action {
        sender: FriendCode,
        kind: ActionKind,
        payload: Bytes,
    },

    /// `ghost` is taking control of this client.
    PossessionBegin { ghost: FriendCode },

    /// Camera update from the ghost.
    PossessionCamera {
        ghost: FriendCode,
        frame: CameraFrame,
    },

    /// Movement update from the ghost.
    PossessionMovement {
        ghost: FriendCode,
        frame: MovementFrame,
    },

    /// The session with `by` is over.
    PossessionEnd { by: FriendCode },
}

impl ForwardedCall {
    /// Encode for the wire.
    pub fn to_bytes(&self) -> tether_core::Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from the wire.
    pub fn from_bytes(bytes: &[u8]) -> tether_core::Result<Self> {
        decode(bytes)
    }
}
