//! Proptest generators for property-based testing.

use proptest::prelude::*;

use tether_core::{ActionKind, FriendCode};
use tether_perms::{
    ElevatedPermissions, PermissionSet, PrimaryPermissions, RawPermissions, SpeakPermissions,
};

/// Generate any combination of primary flags.
pub fn primary_permissions() -> impl Strategy<Value = PrimaryPermissions> {
    any::<u32>().prop_map(PrimaryPermissions::from_bits_truncate)
}

/// Generate any combination of speak flags.
pub fn speak_permissions() -> impl Strategy<Value = SpeakPermissions> {
    any::<u32>().prop_map(SpeakPermissions::from_bits_truncate)
}

/// Generate any combination of elevated flags.
pub fn elevated_permissions() -> impl Strategy<Value = ElevatedPermissions> {
    any::<u32>().prop_map(ElevatedPermissions::from_bits_truncate)
}

/// Generate a permission triple.
pub fn permission_set() -> impl Strategy<Value = PermissionSet> {
    (primary_permissions(), speak_permissions(), elevated_permissions())
        .prop_map(|(primary, speak, elevated)| PermissionSet::new(primary, speak, elevated))
}

/// Generate a per-friend override.
pub fn raw_permissions() -> impl Strategy<Value = RawPermissions> {
    (permission_set(), permission_set())
        .prop_map(|(allow, deny)| RawPermissions {
            primary_allow: allow.primary,
            primary_deny: deny.primary,
            speak_allow: allow.speak,
            speak_deny: deny.speak,
            elevated_allow: allow.elevated,
            elevated_deny: deny.elevated,
        })
}

/// Generate a well-formed friend code.
pub fn friend_code() -> impl Strategy<Value = FriendCode> {
    "[A-Z0-9]{1,16}".prop_filter_map("friend code must be valid", |s| FriendCode::new(s).ok())
}

/// Generate an action kind.
pub fn action_kind() -> impl Strategy<Value = ActionKind> {
    prop::sample::select(ActionKind::ALL.to_vec())
}

/// Inputs to one resolution: a grantor's globals and its override for one
/// grantee.
#[derive(Debug, Clone)]
pub struct ResolutionParams {
    pub global: PermissionSet,
    pub raw: RawPermissions,
}

impl ResolutionParams {
    /// What resolution must produce, spelled out bit by bit.
    pub fn expected(&self) -> PermissionSet {
        let (g, r) = (&self.global, &self.raw);
        PermissionSet::new(
            PrimaryPermissions::from_bits_retain(
                (g.primary.bits() | r.primary_allow.bits()) & !r.primary_deny.bits(),
            ),
            SpeakPermissions::from_bits_retain(
                (g.speak.bits() | r.speak_allow.bits()) & !r.speak_deny.bits(),
            ),
            ElevatedPermissions::from_bits_retain(
                (g.elevated.bits() | r.elevated_allow.bits()) & !r.elevated_deny.bits(),
            ),
        )
    }
}

impl Arbitrary for ResolutionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (permission_set(), raw_permissions())
            .prop_map(|(global, raw)| ResolutionParams { global, raw })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_perms::{resolve, ActionRequirements};

    proptest! {
        #[test]
        fn test_resolve_matches_bitwise_formula(params: ResolutionParams) {
            prop_assert_eq!(resolve(&params.global, &params.raw), params.expected());
        }

        #[test]
        fn test_granted_requirement_passes(
            params in any::<ResolutionParams>(),
            required in permission_set(),
        ) {
            let effective = resolve(&params.global, &params.raw);
            let narrowed = PermissionSet::new(
                required.primary & effective.primary,
                required.speak & effective.speak,
                required.elevated & effective.elevated,
            );
            prop_assert!(effective.contains_all(&narrowed));
        }

        #[test]
        fn test_denied_requirement_fails(params: ResolutionParams) {
            prop_assume!(!params.raw.denied().is_empty());
            let effective = resolve(&params.global, &params.raw);
            prop_assert!(!effective.contains_all(&params.raw.denied()));
        }

        #[test]
        fn test_every_kind_has_a_floor(kind in action_kind()) {
            prop_assert!(!kind.minimum_permissions().is_empty());
        }

        #[test]
        fn test_friend_codes_are_well_formed(code in friend_code()) {
            prop_assert!(code.is_well_formed());
        }
    }
}
