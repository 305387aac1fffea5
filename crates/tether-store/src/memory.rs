//! In-memory implementation of the PermissionStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use tether_core::FriendCode;
use tether_perms::{Relationship, ResolvedPermissions, UserPermissions};

use crate::error::{Result, StoreError};
use crate::traits::{PermissionStore, UpsertResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryPermissionStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Global defaults indexed by owner.
    globals: HashMap<FriendCode, ResolvedPermissions>,

    /// Edges: owner -> friend -> edge.
    edges: HashMap<FriendCode, HashMap<FriendCode, UserPermissions>>,
}

impl MemoryPermissionStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryPermissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn get_global(&self, owner: &FriendCode) -> Result<Option<ResolvedPermissions>> {
        let inner = self.read()?;
        Ok(inner.globals.get(owner).copied())
    }

    async fn set_global(&self, owner: &FriendCode, global: &ResolvedPermissions) -> Result<()> {
        let mut inner = self.write()?;
        inner.globals.insert(owner.clone(), *global);
        Ok(())
    }

    async fn get_permissions(
        &self,
        owner: &FriendCode,
    ) -> Result<HashMap<FriendCode, UserPermissions>> {
        let inner = self.read()?;
        Ok(inner.edges.get(owner).cloned().unwrap_or_default())
    }

    async fn get_user_permissions(
        &self,
        owner: &FriendCode,
        friend: &FriendCode,
    ) -> Result<Option<UserPermissions>> {
        let inner = self.read()?;
        Ok(inner
            .edges
            .get(owner)
            .and_then(|friends| friends.get(friend))
            .cloned())
    }

    async fn upsert_permissions(&self, edge: &UserPermissions) -> Result<UpsertResult> {
        let mut inner = self.write()?;
        let previous = inner
            .edges
            .entry(edge.owner.clone())
            .or_default()
            .insert(edge.friend.clone(), edge.clone());

        Ok(match previous {
            Some(_) => UpsertResult::Updated,
            None => UpsertResult::Inserted,
        })
    }

    async fn remove_permissions(&self, owner: &FriendCode, friend: &FriendCode) -> Result<bool> {
        let mut inner = self.write()?;
        let Some(friends) = inner.edges.get_mut(owner) else {
            return Ok(false);
        };
        let removed = friends.remove(friend).is_some();
        if friends.is_empty() {
            inner.edges.remove(owner);
        }
        Ok(removed)
    }

    async fn get_relationship(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
    ) -> Result<Option<Relationship>> {
        let inner = self.read()?;
        let Some(edge) = inner.edges.get(grantor).and_then(|f| f.get(grantee)) else {
            return Ok(None);
        };
        let global = inner.globals.get(grantor).copied().unwrap_or_default();
        Ok(Some(Relationship::new(global, edge.overrides)))
    }
}
