//! Authorization gate: may `sender` do `required` to `target` right now?
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the target must be online (the store is not consulted otherwise),
//! 2. the target must have added the sender as a friend,
//! 3. what the target granted the sender must contain every required bit.

use std::fmt;
use std::sync::Arc;

use tether_core::{ActionResultEc, FriendCode};
use tether_perms::PermissionSet;
use tether_store::{PermissionStore, PermissionStoreExt};

use crate::presence::PresenceRegistry;
use crate::transport::ConnectionHandle;

/// Why a target was not reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    TargetOffline,
    TargetNotFriends,
    TargetHasNotGrantedSenderPermissions,
    /// The store failed; logged where it happened.
    Unknown,
}

impl From<DenialReason> for ActionResultEc {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::TargetOffline => ActionResultEc::TargetOffline,
            DenialReason::TargetNotFriends => ActionResultEc::TargetNotFriends,
            DenialReason::TargetHasNotGrantedSenderPermissions => {
                ActionResultEc::TargetHasNotGrantedSenderPermissions
            }
            DenialReason::Unknown => ActionResultEc::Unknown,
        }
    }
}

/// Decides per-target authorization against presence and stored grants.
#[derive(Clone)]
pub struct Authorizer {
    presence: Arc<PresenceRegistry>,
    store: Arc<dyn PermissionStore>,
}

impl Authorizer {
    pub fn new(presence: Arc<PresenceRegistry>, store: Arc<dyn PermissionStore>) -> Self {
        Self { presence, store }
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    /// Authorize one target, returning its connection on success.
    pub async fn authorize(
        &self,
        sender: &FriendCode,
        target: &FriendCode,
        required: &PermissionSet,
    ) -> Result<ConnectionHandle, DenialReason> {
        let Some(connection) = self.presence.try_get(target) else {
            return Err(DenialReason::TargetOffline);
        };

        // The target is the grantor: it decides what the sender may do to it.
        let granted = match self.store.granted_to(target, sender).await {
            Ok(Some(granted)) => granted,
            Ok(None) => return Err(DenialReason::TargetNotFriends),
            Err(e) => {
                tracing::warn!(%sender, %target, error = %e, "permission lookup failed");
                return Err(DenialReason::Unknown);
            }
        };

        if !granted.contains_all(required) {
            tracing::debug!(
                %sender,
                %target,
                missing = ?granted.missing(required),
                "target has not granted required permissions"
            );
            return Err(DenialReason::TargetHasNotGrantedSenderPermissions);
        }

        Ok(connection)
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("presence", &self.presence)
            .finish_non_exhaustive()
    }
}
