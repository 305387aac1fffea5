//! The allow/deny resolver.

use crate::set::{RawPermissions, ResolvedPermissions};

/// Merge a user's global defaults with one friend's override.
///
/// Per category: `(global | allow) & !deny`. Pure and deterministic; callers
/// may cache the result, this function never does.
///
/// There is no "no relationship" input: when no friendship exists the caller
/// must treat that as no permission and not call this with an empty override.
pub fn resolve(global: &ResolvedPermissions, raw: &RawPermissions) -> ResolvedPermissions {
    ResolvedPermissions {
        primary: (global.primary | raw.primary_allow) & !raw.primary_deny,
        speak: (global.speak | raw.speak_allow) & !raw.speak_deny,
        elevated: (global.elevated | raw.elevated_allow) & !raw.elevated_deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{ElevatedPermissions, PrimaryPermissions, SpeakPermissions};
    use crate::set::PermissionSet;
    use proptest::prelude::*;

    fn raw_from_bits(bits: [u32; 6]) -> RawPermissions {
        RawPermissions {
            primary_allow: PrimaryPermissions::from_bits_truncate(bits[0]),
            primary_deny: PrimaryPermissions::from_bits_truncate(bits[1]),
            speak_allow: SpeakPermissions::from_bits_truncate(bits[2]),
            speak_deny: SpeakPermissions::from_bits_truncate(bits[3]),
            elevated_allow: ElevatedPermissions::from_bits_truncate(bits[4]),
            elevated_deny: ElevatedPermissions::from_bits_truncate(bits[5]),
        }
    }

    fn set_from_bits(bits: [u32; 3]) -> PermissionSet {
        PermissionSet::new(
            PrimaryPermissions::from_bits_truncate(bits[0]),
            SpeakPermissions::from_bits_truncate(bits[1]),
            ElevatedPermissions::from_bits_truncate(bits[2]),
        )
    }

    #[test]
    fn test_empty_override_keeps_global() {
        let global = PermissionSet::primary(PrimaryPermissions::EMOTE)
            .with_speak(SpeakPermissions::SAY);
        assert_eq!(resolve(&global, &RawPermissions::default()), global);
    }

    #[test]
    fn test_allow_extends_global() {
        let global = PermissionSet::primary(PrimaryPermissions::EMOTE);
        let raw = RawPermissions::default().allow_primary(PrimaryPermissions::BODY_SWAP);

        let effective = resolve(&global, &raw);
        assert_eq!(
            effective.primary,
            PrimaryPermissions::EMOTE | PrimaryPermissions::BODY_SWAP
        );
    }

    #[test]
    fn test_deny_beats_global_and_allow() {
        let global = PermissionSet::primary(PrimaryPermissions::BODY_SWAP);
        let raw = RawPermissions::default()
            .allow_primary(PrimaryPermissions::BODY_SWAP)
            .deny_primary(PrimaryPermissions::BODY_SWAP);

        assert!(resolve(&global, &raw).primary.is_empty());
    }

    #[test]
    fn test_categories_are_independent() {
        let global = PermissionSet::ALL;
        let raw = RawPermissions::default().deny_speak(SpeakPermissions::all());

        let effective = resolve(&global, &raw);
        assert_eq!(effective.primary, PrimaryPermissions::all());
        assert!(effective.speak.is_empty());
        assert_eq!(effective.elevated, ElevatedPermissions::all());
    }

    proptest! {
        #[test]
        fn test_resolve_matches_formula(g in any::<[u32; 3]>(), r in any::<[u32; 6]>()) {
            let global = set_from_bits(g);
            let raw = raw_from_bits(r);
            let effective = resolve(&global, &raw);

            prop_assert_eq!(
                effective.primary.bits(),
                (global.primary.bits() | raw.primary_allow.bits()) & !raw.primary_deny.bits()
            );
            prop_assert_eq!(
                effective.speak.bits(),
                (global.speak.bits() | raw.speak_allow.bits()) & !raw.speak_deny.bits()
            );
            prop_assert_eq!(
                effective.elevated.bits(),
                (global.elevated.bits() | raw.elevated_allow.bits()) & !raw.elevated_deny.bits()
            );
        }

        #[test]
        fn test_denied_bits_never_survive(g in any::<[u32; 3]>(), r in any::<[u32; 6]>()) {
            let effective = resolve(&set_from_bits(g), &raw_from_bits(r));
            let denied = raw_from_bits(r).denied();

            prop_assert!(effective.primary.intersection(denied.primary).is_empty());
            prop_assert!(effective.speak.intersection(denied.speak).is_empty());
            prop_assert!(effective.elevated.intersection(denied.elevated).is_empty());
        }

        #[test]
        fn test_resolve_is_deterministic(g in any::<[u32; 3]>(), r in any::<[u32; 6]>()) {
            let global = set_from_bits(g);
            let raw = raw_from_bits(r);
            prop_assert_eq!(resolve(&global, &raw), resolve(&global, &raw));
        }

        #[test]
        fn test_single_bit_categories_do_not_leak(bit in 0u32..12) {
            // A primary allow never grants anything outside primary.
            let raw = RawPermissions::default()
                .allow_primary(PrimaryPermissions::from_bits_truncate(1 << bit));
            let effective = resolve(&PermissionSet::NONE, &raw);
            prop_assert!(effective.speak.is_empty());
            prop_assert!(effective.elevated.is_empty());
        }
    }
}
