//! Resolution vectors for cross-implementation verification.
//!
//! Each vector fixes a grantor's globals, its override for one grantee and a
//! requirement, together with the effective set and the authorization
//! decision every implementation must reach.

use tether_perms::{
    resolve, ElevatedPermissions, PermissionSet, PrimaryPermissions, RawPermissions,
    SpeakPermissions,
};

/// A resolution test vector.
#[derive(Debug, Clone)]
pub struct ResolutionVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Grantor's global defaults.
    pub global: PermissionSet,
    /// Grantor's override for the grantee.
    pub overrides: RawPermissions,
    /// What the action needs.
    pub required: PermissionSet,
    /// Expected effective permissions.
    pub expected: PermissionSet,
    /// Whether the grantee may perform the action.
    pub expected_granted: bool,
}

/// Get all resolution vectors.
pub fn all_vectors() -> Vec<ResolutionVector> {
    let say = PermissionSet::speak(SpeakPermissions::SAY);
    let emote = PermissionSet::primary(PrimaryPermissions::EMOTE);

    vec![
        ResolutionVector {
            name: "global grant passes through",
            global: emote,
            overrides: RawPermissions::default(),
            required: emote,
            expected: emote,
            expected_granted: true,
        },
        ResolutionVector {
            name: "empty global denies",
            global: PermissionSet::NONE,
            overrides: RawPermissions::default(),
            required: emote,
            expected: PermissionSet::NONE,
            expected_granted: false,
        },
        ResolutionVector {
            name: "allow adds to global",
            global: emote,
            overrides: RawPermissions::default().allow_speak(SpeakPermissions::SAY),
            required: emote.union(&say),
            expected: emote.union(&say),
            expected_granted: true,
        },
        ResolutionVector {
            name: "deny beats global",
            global: say,
            overrides: RawPermissions::default().deny_speak(SpeakPermissions::SAY),
            required: say,
            expected: PermissionSet::NONE,
            expected_granted: false,
        },
        ResolutionVector {
            name: "deny beats allow",
            global: PermissionSet::NONE,
            overrides: RawPermissions::default()
                .allow_primary(PrimaryPermissions::POSSESSION)
                .deny_primary(PrimaryPermissions::POSSESSION),
            required: PermissionSet::primary(PrimaryPermissions::POSSESSION),
            expected: PermissionSet::NONE,
            expected_granted: false,
        },
        ResolutionVector {
            name: "categories do not leak",
            global: PermissionSet::primary(PrimaryPermissions::all()),
            overrides: RawPermissions::default()
                .deny_elevated(ElevatedPermissions::PERMANENT_TRANSFORMATION),
            required: PermissionSet::elevated(ElevatedPermissions::EDIT_ATTRIBUTES),
            expected: PermissionSet::primary(PrimaryPermissions::all()),
            expected_granted: false,
        },
        ResolutionVector {
            name: "empty requirement always passes",
            global: PermissionSet::NONE,
            overrides: RawPermissions::denying(&PermissionSet::ALL),
            required: PermissionSet::NONE,
            expected: PermissionSet::NONE,
            expected_granted: true,
        },
        ResolutionVector {
            name: "linkshell channel needs its own bit",
            global: PermissionSet::speak(SpeakPermissions::LS1 | SpeakPermissions::SAY),
            overrides: RawPermissions::default(),
            required: PermissionSet::speak(SpeakPermissions::LS2),
            expected: PermissionSet::speak(SpeakPermissions::LS1 | SpeakPermissions::SAY),
            expected_granted: false,
        },
    ]
}

/// Check every vector against this implementation.
///
/// Returns `(name, passed)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool)> {
    all_vectors()
        .iter()
        .map(|v| {
            let effective = resolve(&v.global, &v.overrides);
            let passed = effective == v.expected
                && effective.contains_all(&v.required) == v.expected_granted;
            (v.name.to_string(), passed)
        })
        .collect()
}
