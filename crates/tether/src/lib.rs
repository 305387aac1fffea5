//! # Tether
//!
//! A relay that lets friends trigger actions on each other's clients, gated
//! by directional, fine-grained permissions.
//!
//! ## Overview
//!
//! - **Permissions**: every user has global defaults and per-friend
//!   allow/deny overrides. Deny always wins.
//! - **Presence**: only online clients can be reached.
//! - **Relay**: one request, many targets, one result code per target.
//! - **Possession**: one ghost continuously controls one host.
//!
//! ## Key Concepts
//!
//! - **Directionality**: when A acts on B, B's grant to A decides.
//! - **Isolation**: a slow or dead target never holds up its siblings.
//! - **Exclusivity**: a friend code is in at most one possession session.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tether::{Hub, HubConfig};
//! use tether::core::{ActionKind, FriendCode};
//! use tether::relay::{pair, ActionRequest};
//! use tether::store::SqlitePermissionStore;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = SqlitePermissionStore::open("tether.db")?;
//!     let hub = Hub::new(store, HubConfig::from_json_file("tether.json")?);
//!
//!     let alice = FriendCode::new("ALICE")?;
//!     let (connection, _client) = pair(16);
//!     hub.on_connect(alice.clone(), connection.into_handle());
//!
//!     let request = ActionRequest::new(
//!         ActionKind::Emote,
//!         vec![FriendCode::new("BOB")?],
//!         &b"/wave"[..],
//!     );
//!     let response = hub.handle_action(&alice, request).await;
//!     println!("{:?}", response.results);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `tether::core` - Friend codes, action kinds, result codes
//! - `tether::perms` - Permission flags and the resolver
//! - `tether::store` - Storage abstraction and SQLite
//! - `tether::relay` - Presence, authorization, relay and possession

pub mod config;
pub mod error;
pub mod hub;

// Re-export component crates
pub use tether_core as core;
pub use tether_perms as perms;
pub use tether_relay as relay;
pub use tether_store as store;

// Re-export main types for convenience
pub use config::HubConfig;
pub use error::{HubError, Result};
pub use hub::{AccountView, FriendView, Hub};

// Re-export commonly used types
pub use tether_core::{
    ActionKind, ActionResponse, ActionResponseEc, ActionResult, ActionResultEc, FriendCode,
};
pub use tether_perms::{
    ElevatedPermissions, PermissionSet, PrimaryPermissions, RawPermissions, SpeakPermissions,
    UserPermissions,
};
pub use tether_relay::{ActionRequest, CameraFrame, MovementFrame, PossessionState};
