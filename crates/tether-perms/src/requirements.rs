//! The minimum grant each action kind needs.
//!
//! A request may ask for more (a speak action names its channel), never for
//! less: the relay always checks the union of this floor and what the
//! request carries.

use tether_core::ActionKind;

use crate::flags::PrimaryPermissions;
use crate::set::PermissionSet;

/// Permission floor of an action kind.
pub trait ActionRequirements {
    fn minimum_permissions(self) -> PermissionSet;
}

impl ActionRequirements for ActionKind {
    fn minimum_permissions(self) -> PermissionSet {
        let primary = match self {
            ActionKind::Speak => PrimaryPermissions::SPEAK,
            ActionKind::Emote => PrimaryPermissions::EMOTE,
            ActionKind::Transform => PrimaryPermissions::CUSTOMIZATION,
            ActionKind::BodySwap => PrimaryPermissions::BODY_SWAP,
            ActionKind::Twinning => PrimaryPermissions::TWINNING,
            ActionKind::Moodles => PrimaryPermissions::MOODLES,
            ActionKind::Hypnosis => PrimaryPermissions::HYPNOSIS,
            ActionKind::Honorific => PrimaryPermissions::HONORIFIC,
            ActionKind::CustomizePlus => PrimaryPermissions::CUSTOMIZE_PLUS,
        };
        PermissionSet::primary(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_floor() {
        for kind in ActionKind::ALL {
            let floor = kind.minimum_permissions();
            assert!(!floor.is_empty(), "{:?} has no permission floor", kind);
            assert_eq!(floor.primary.bits().count_ones(), 1);
        }
    }

    #[test]
    fn test_floors_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for kind in ActionKind::ALL {
            assert!(seen.insert(kind.minimum_permissions()));
        }
    }

    #[test]
    fn test_possession_is_not_a_one_shot_floor() {
        for kind in ActionKind::ALL {
            assert!(!kind
                .minimum_permissions()
                .primary
                .contains(PrimaryPermissions::POSSESSION));
        }
    }
}
