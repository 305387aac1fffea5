//! # Tether Testkit
//!
//! Testing utilities for Tether.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a hub over a memory store, with accounts and friendships
//! - **Scripted peers**: clients that accept, refuse, hang, fail or desync
//! - **Generators**: Proptest strategies for permission sets and overrides
//! - **Resolution vectors**: known inputs with expected effective permissions
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use tether_testkit::{Behavior, TestFixture};
//! use tether::{ActionKind, ActionRequest, PermissionSet, RawPermissions};
//!
//! # async fn example() {
//! let fixture = TestFixture::new();
//! let alice = fixture.account("ALICE", PermissionSet::NONE).await;
//! let bob = fixture.account("BOB", PermissionSet::ALL).await;
//! fixture.befriend(&bob, &alice, RawPermissions::default()).await;
//!
//! let _alice_client = fixture.connect(&alice, Behavior::Accept);
//! let mut bob_client = fixture.connect(&bob, Behavior::Accept);
//!
//! let request = ActionRequest::new(ActionKind::Emote, vec![bob.clone()], &b"/wave"[..]);
//! let response = fixture.hub.handle_action(&alice, request).await;
//! assert!(response.results[&bob].is_success());
//! assert!(bob_client.next_call().await.is_some());
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tether_testkit::generators::ResolutionParams;
//!
//! proptest! {
//!     #[test]
//!     fn resolve_is_deterministic(params: ResolutionParams) {
//!         let a = tether_perms::resolve(&params.global, &params.raw);
//!         let b = tether_perms::resolve(&params.global, &params.raw);
//!         prop_assert_eq!(a, b);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod peers;
pub mod vectors;

pub use fixtures::{init_tracing, multi_party_fixture, TestFixture};
pub use generators::{permission_set, raw_permissions, ResolutionParams};
pub use peers::{Behavior, ScriptedPeer};
pub use vectors::{all_vectors, verify_all_vectors, ResolutionVector};
