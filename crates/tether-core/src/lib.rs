//! # Tether Core
//!
//! Pure primitives shared by every Tether crate: friend codes, action kinds,
//! per-target and request-level result codes, and the CBOR wire codec.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`FriendCode`] - Opaque account identifier, the key of every registry
//! - [`ActionKind`] - What a relayed action does, and its cooldown category
//! - [`ActionResult`] - Outcome for exactly one target
//! - [`ActionResponse`] - Outcome of a whole multi-target request
//!
//! ## Result Codes
//!
//! Target-specific outcomes are never errors. They are values of the closed
//! [`ActionResultEc`] set, collected per target. Only problems detected
//! before any per-target work are reported through [`ActionResponseEc`].

pub mod action;
pub mod codec;
pub mod error;
pub mod result;
pub mod types;

pub use action::{ActionKind, CooldownCategory};
pub use codec::{decode, encode, limits};
pub use error::{CoreError, Result};
pub use result::{ActionResponse, ActionResponseEc, ActionResult, ActionResultEc};
pub use types::FriendCode;
