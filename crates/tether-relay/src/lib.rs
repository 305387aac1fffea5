//! # Tether Relay
//!
//! Authorization-then-forward pipeline for actions between online friends.
//!
//! ## Overview
//!
//! A sender names an action and a list of targets. For every target,
//! independently and concurrently, the relay checks that the target is
//! online, that the target has granted the sender the permissions the action
//! needs, and then forwards the call with a deadline. Every target ends up
//! with exactly one result code; a slow target never delays the others.
//!
//! Possession is the stateful variant: one ghost continuously drives one
//! host through an exclusive session.
//!
//! ## Key Types
//!
//! - [`PresenceRegistry`]: online clients and their connections
//! - [`Authorizer`]: the per-target gate
//! - [`ActionRelay`]: fan-out with per-call timeouts
//! - [`PossessionBroker`]: exclusive ghost/host sessions
//! - [`Connection`]: how a call reaches a client
//!
//! ## Flow
//!
//! ```text
//! sender ──ActionRequest──▶ relay ─┬─ gate(B) ── call ──▶ B ──┐
//!                                  ├─ gate(C) ── denied ──────┤
//!                                  └─ gate(D) ── call ──▶ D ──┤ (timeout)
//! sender ◀──ActionResponse { B: Success, C: Denied, D: Timeout }
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod messages;
pub mod possession;
pub mod presence;
pub mod relay;
pub mod transport;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use gate::{Authorizer, DenialReason};
pub use messages::{ActionRequest, CameraFrame, ForwardedCall, MovementFrame, PossessionUpdate};
pub use possession::{PossessionBroker, PossessionState, SessionInfo};
pub use presence::{Presence, PresenceRegistry};
pub use relay::{forward, ActionRelay};
pub use transport::{
    memory::{pair, IncomingCall, MemoryConnection, MemoryPeer},
    Connection, ConnectionHandle,
};
