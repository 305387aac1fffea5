//! # Tether Permissions
//!
//! The permission model and the allow/deny resolver.
//!
//! ## Overview
//!
//! Every user owns a set of global defaults ([`ResolvedPermissions`]) that
//! apply to every friend, and may layer a per-friend override
//! ([`RawPermissions`]) on top. The effective grant for one friend is computed
//! independently for each of the three categories:
//!
//! ```text
//! effective = (global | allow) & !deny
//! ```
//!
//! Deny is applied last, so it always wins over both the global default and
//! the allow mask.
//!
//! ## Key Concepts
//!
//! - **Primary**: feature toggles (emote, body swap, possession, ...)
//! - **Speak**: per chat channel toggles (say, party, linkshells, ...)
//! - **Elevated**: high-risk grants (permanent transformation, ...)
//! - **UserPermissions**: the stored edge `A -> B`, "what A has granted B"
//!
//! ## Usage
//!
//! ```rust
//! use tether_perms::{resolve, PermissionSet, PrimaryPermissions, RawPermissions};
//!
//! let global = PermissionSet::primary(PrimaryPermissions::EMOTE | PrimaryPermissions::BODY_SWAP);
//! let raw = RawPermissions::default().deny_primary(PrimaryPermissions::BODY_SWAP);
//!
//! let effective = resolve(&global, &raw);
//! assert!(effective.contains_all(&PermissionSet::primary(PrimaryPermissions::EMOTE)));
//! assert!(!effective.contains_all(&PermissionSet::primary(PrimaryPermissions::BODY_SWAP)));
//! ```

pub mod flags;
pub mod requirements;
pub mod resolve;
pub mod set;
pub mod user;

pub use flags::{ElevatedPermissions, PrimaryPermissions, SpeakPermissions};
pub use requirements::ActionRequirements;
pub use resolve::resolve;
pub use set::{PermissionSet, RawPermissions, ResolvedPermissions};
pub use user::{Relationship, UserPermissions};
