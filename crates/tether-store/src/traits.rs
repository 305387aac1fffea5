//! PermissionStore trait: the abstract interface for permission persistence.
//!
//! This trait keeps the relay storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use std::collections::HashMap;

use async_trait::async_trait;
use tether_core::FriendCode;
use tether_perms::{Relationship, ResolvedPermissions, UserPermissions};

use crate::error::Result;

/// Result of writing a permission edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    /// The edge did not exist and was created.
    Inserted,
    /// An existing edge had its overrides replaced.
    Updated,
}

/// The PermissionStore trait: async interface for permission persistence.
///
/// # Design Notes
///
/// - Every edge is directed. `get_permissions(owner)` returns what `owner`
///   has granted each of their friends, never the reverse.
/// - An owner with no globals row is an unknown account; its edges (if any)
///   resolve against an empty global set.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Global Defaults
    // ─────────────────────────────────────────────────────────────────────────

    /// Get an owner's global defaults, `None` for an unknown account.
    async fn get_global(&self, owner: &FriendCode) -> Result<Option<ResolvedPermissions>>;

    /// Create or replace an owner's global defaults.
    async fn set_global(&self, owner: &FriendCode, global: &ResolvedPermissions) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────────────────────

    /// Every edge `owner -> friend`, keyed by friend.
    async fn get_permissions(
        &self,
        owner: &FriendCode,
    ) -> Result<HashMap<FriendCode, UserPermissions>>;

    /// One edge `owner -> friend`.
    async fn get_user_permissions(
        &self,
        owner: &FriendCode,
        friend: &FriendCode,
    ) -> Result<Option<UserPermissions>>;

    /// Create the edge or replace its overrides.
    async fn upsert_permissions(&self, edge: &UserPermissions) -> Result<UpsertResult>;

    /// Delete one edge. Returns whether it existed.
    async fn remove_permissions(&self, owner: &FriendCode, friend: &FriendCode) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization Read
    // ─────────────────────────────────────────────────────────────────────────

    /// The grantor's globals and the `grantor -> grantee` edge together.
    ///
    /// Backends should override this with a single read.
    async fn get_relationship(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
    ) -> Result<Option<Relationship>> {
        let Some(edge) = self.get_user_permissions(grantor, grantee).await? else {
            return Ok(None);
        };
        let global = self.get_global(grantor).await?.unwrap_or_default();
        Ok(Some(Relationship::new(global, edge.overrides)))
    }
}

/// Extension trait for directional permission lookups.
pub trait PermissionStoreExt: PermissionStore {
    /// What `grantor` has granted `grantee`, resolved.
    ///
    /// `None` when there is no friendship edge from `grantor` to `grantee`.
    /// Authorization always asks what the *target* granted the *sender*, so
    /// the target is the grantor.
    fn granted_to(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
    ) -> impl std::future::Future<Output = Result<Option<ResolvedPermissions>>> + Send;
}

impl<S: PermissionStore + ?Sized> PermissionStoreExt for S {
    async fn granted_to(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
    ) -> Result<Option<ResolvedPermissions>> {
        let relationship = self.get_relationship(grantor, grantee).await?;
        Ok(relationship.map(|r| r.effective()))
    }
}
