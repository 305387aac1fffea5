//! Permission triples and per-friend overrides.

use serde::{Deserialize, Serialize};

use crate::flags::{ElevatedPermissions, PrimaryPermissions, SpeakPermissions};

/// One mask per category.
///
/// Used for a user's global defaults, for resolved effective permissions and
/// for the permissions an action requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionSet {
    pub primary: PrimaryPermissions,
    pub speak: SpeakPermissions,
    pub elevated: ElevatedPermissions,
}

/// A user's global defaults, or the effective result of [`crate::resolve`].
pub type ResolvedPermissions = PermissionSet;

impl PermissionSet {
    /// The empty set. As a requirement it always passes.
    pub const NONE: Self = Self {
        primary: PrimaryPermissions::empty(),
        speak: SpeakPermissions::empty(),
        elevated: ElevatedPermissions::empty(),
    };

    /// Every bit of every category.
    pub const ALL: Self = Self {
        primary: PrimaryPermissions::all(),
        speak: SpeakPermissions::all(),
        elevated: ElevatedPermissions::all(),
    };

    pub fn new(
        primary: PrimaryPermissions,
        speak: SpeakPermissions,
        elevated: ElevatedPermissions,
    ) -> Self {
        Self {
            primary,
            speak,
            elevated,
        }
    }

    /// A set with only primary bits.
    pub fn primary(primary: PrimaryPermissions) -> Self {
        Self {
            primary,
            ..Self::NONE
        }
    }

    /// A set with only speak bits.
    pub fn speak(speak: SpeakPermissions) -> Self {
        Self {
            speak,
            ..Self::NONE
        }
    }

    /// A set with only elevated bits.
    pub fn elevated(elevated: ElevatedPermissions) -> Self {
        Self {
            elevated,
            ..Self::NONE
        }
    }

    pub fn with_primary(mut self, primary: PrimaryPermissions) -> Self {
        self.primary |= primary;
        self
    }

    pub fn with_speak(mut self, speak: SpeakPermissions) -> Self {
        self.speak |= speak;
        self
    }

    pub fn with_elevated(mut self, elevated: ElevatedPermissions) -> Self {
        self.elevated |= elevated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.speak.is_empty() && self.elevated.is_empty()
    }

    /// Category-wise union.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            primary: self.primary | other.primary,
            speak: self.speak | other.speak,
            elevated: self.elevated | other.elevated,
        }
    }

    /// Containment test: `(self & required) == required` in every category.
    pub fn contains_all(&self, required: &Self) -> bool {
        self.primary.contains(required.primary)
            && self.speak.contains(required.speak)
            && self.elevated.contains(required.elevated)
    }

    /// The required bits this set does not grant.
    pub fn missing(&self, required: &Self) -> Self {
        Self {
            primary: required.primary - self.primary,
            speak: required.speak - self.speak,
            elevated: required.elevated - self.elevated,
        }
    }
}

/// A per-friend allow/deny overlay on top of the owner's global defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawPermissions {
    pub primary_allow: PrimaryPermissions,
    pub primary_deny: PrimaryPermissions,
    pub speak_allow: SpeakPermissions,
    pub speak_deny: SpeakPermissions,
    pub elevated_allow: ElevatedPermissions,
    pub elevated_deny: ElevatedPermissions,
}

impl RawPermissions {
    /// Allow a whole set on top of the global defaults.
    pub fn allowing(set: &PermissionSet) -> Self {
        Self {
            primary_allow: set.primary,
            speak_allow: set.speak,
            elevated_allow: set.elevated,
            ..Self::default()
        }
    }

    /// Deny a whole set regardless of the global defaults.
    pub fn denying(set: &PermissionSet) -> Self {
        Self {
            primary_deny: set.primary,
            speak_deny: set.speak,
            elevated_deny: set.elevated,
            ..Self::default()
        }
    }

    pub fn allow_primary(mut self, bits: PrimaryPermissions) -> Self {
        self.primary_allow |= bits;
        self
    }

    pub fn deny_primary(mut self, bits: PrimaryPermissions) -> Self {
        self.primary_deny |= bits;
        self
    }

    pub fn allow_speak(mut self, bits: SpeakPermissions) -> Self {
        self.speak_allow |= bits;
        self
    }

    pub fn deny_speak(mut self, bits: SpeakPermissions) -> Self {
        self.speak_deny |= bits;
        self
    }

    pub fn allow_elevated(mut self, bits: ElevatedPermissions) -> Self {
        self.elevated_allow |= bits;
        self
    }

    pub fn deny_elevated(mut self, bits: ElevatedPermissions) -> Self {
        self.elevated_deny |= bits;
        self
    }

    /// The allow masks as a set.
    pub fn allowed(&self) -> PermissionSet {
        PermissionSet::new(self.primary_allow, self.speak_allow, self.elevated_allow)
    }

    /// The deny masks as a set.
    pub fn denied(&self) -> PermissionSet {
        PermissionSet::new(self.primary_deny, self.speak_deny, self.elevated_deny)
    }

    /// True when no override is set at all.
    ///
    /// An empty override still means the relationship exists.
    pub fn is_empty(&self) -> bool {
        self.allowed().is_empty() && self.denied().is_empty()
    }
}
