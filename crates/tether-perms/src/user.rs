//! Stored permission edges.
//!
//! A [`UserPermissions`] edge `A -> B` records what A has granted B may do
//! to A. It is created when A adds B to their friend list, updated when A
//! edits that entry, and deleted when the friendship is removed.

use serde::{Deserialize, Serialize};

use tether_core::FriendCode;

use crate::resolve::resolve;
use crate::set::{RawPermissions, ResolvedPermissions};

/// The directed edge "what `owner` has granted `friend`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// The grantor.
    pub owner: FriendCode,

    /// The grantee.
    pub friend: FriendCode,

    /// Overrides layered on the owner's global defaults for this friend.
    pub overrides: RawPermissions,
}

impl UserPermissions {
    /// A fresh edge with no overrides: the friend gets exactly the owner's globals.
    pub fn new(owner: FriendCode, friend: FriendCode) -> Self {
        Self {
            owner,
            friend,
            overrides: RawPermissions::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: RawPermissions) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Everything needed to decide what a grantor allows one grantee: the
/// grantor's globals plus the override stored on the edge.
///
/// Only exists when the edge exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub global: ResolvedPermissions,
    pub overrides: RawPermissions,
}

impl Relationship {
    pub fn new(global: ResolvedPermissions, overrides: RawPermissions) -> Self {
        Self { global, overrides }
    }

    /// The effective grant, see [`resolve`].
    pub fn effective(&self) -> ResolvedPermissions {
        resolve(&self.global, &self.overrides)
    }
}
