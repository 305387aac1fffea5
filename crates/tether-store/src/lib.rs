//! # Tether Store
//!
//! Storage abstraction for permission and account records. The relay only
//! ever talks to the [`PermissionStore`] trait, so the backing database is
//! an external, swappable collaborator.
//!
//! ## Key Types
//!
//! - [`PermissionStore`] - The async trait for all permission reads and writes
//! - [`PermissionStoreExt`] - `granted_to`, the one place directionality is encoded
//! - [`SqlitePermissionStore`] - SQLite-based persistent storage
//! - [`MemoryPermissionStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tether_core::FriendCode;
//! use tether_perms::{PermissionSet, PrimaryPermissions, UserPermissions};
//! use tether_store::{PermissionStore, PermissionStoreExt, SqlitePermissionStore};
//!
//! async fn example() {
//!     let store = SqlitePermissionStore::open("tether.db").unwrap();
//!
//!     let alice = FriendCode::new("ALICE").unwrap();
//!     let bob = FriendCode::new("BOB").unwrap();
//!
//!     // Alice grants emotes to every friend, and adds Bob.
//!     store
//!         .set_global(&alice, &PermissionSet::primary(PrimaryPermissions::EMOTE))
//!         .await
//!         .unwrap();
//!     store
//!         .upsert_permissions(&UserPermissions::new(alice.clone(), bob.clone()))
//!         .await
//!         .unwrap();
//!
//!     // What has Alice granted Bob?
//!     let granted = store.granted_to(&alice, &bob).await.unwrap();
//!     assert!(granted.is_some());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absence is meaningful**: a missing edge is "not friends", which is a
//!   different state from an edge with empty overrides.
//! - **One read per check**: [`PermissionStore::get_relationship`] returns
//!   the grantor's globals and the edge together.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryPermissionStore;
pub use sqlite::SqlitePermissionStore;
pub use traits::{PermissionStore, PermissionStoreExt, UpsertResult};
