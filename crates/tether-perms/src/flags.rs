//! Permission bitmasks, one type per category.
//!
//! Categories never mix: a speak bit can only be granted, allowed or denied
//! through a [`SpeakPermissions`] mask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Feature toggles.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrimaryPermissions: u32 {
        const EMOTE          = 1 << 0;
        /// Gate for all speak actions; the channel is checked in [`SpeakPermissions`].
        const SPEAK          = 1 << 1;
        const CUSTOMIZATION  = 1 << 2;
        const EQUIPMENT      = 1 << 3;
        const MODS           = 1 << 4;
        const BODY_SWAP      = 1 << 5;
        const TWINNING       = 1 << 6;
        const MOODLES        = 1 << 7;
        const HYPNOSIS       = 1 << 8;
        const POSSESSION     = 1 << 9;
        const HONORIFIC      = 1 << 10;
        const CUSTOMIZE_PLUS = 1 << 11;
    }
}

bitflags! {
    /// Per chat channel toggles.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SpeakPermissions: u32 {
        const SAY          = 1 << 0;
        const YELL         = 1 << 1;
        const SHOUT        = 1 << 2;
        const TELL         = 1 << 3;
        const PARTY        = 1 << 4;
        const ALLIANCE     = 1 << 5;
        const FREE_COMPANY = 1 << 6;
        const PVP_TEAM     = 1 << 7;
        const ECHO         = 1 << 8;
        const ROLEPLAY     = 1 << 9;

        const LS1 = 1 << 10;
        const LS2 = 1 << 11;
        const LS3 = 1 << 12;
        const LS4 = 1 << 13;
        const LS5 = 1 << 14;
        const LS6 = 1 << 15;
        const LS7 = 1 << 16;
        const LS8 = 1 << 17;

        const CWL1 = 1 << 18;
        const CWL2 = 1 << 19;
        const CWL3 = 1 << 20;
        const CWL4 = 1 << 21;
        const CWL5 = 1 << 22;
        const CWL6 = 1 << 23;
        const CWL7 = 1 << 24;
        const CWL8 = 1 << 25;
    }
}

bitflags! {
    /// High-risk grants.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ElevatedPermissions: u32 {
        /// Changes that persist after the sender disconnects.
        const PERMANENT_TRANSFORMATION = 1 << 0;
        const EDIT_ATTRIBUTES          = 1 << 1;
    }
}

impl SpeakPermissions {
    /// Every linkshell channel.
    pub const LINKSHELLS: Self = Self::LS1
        .union(Self::LS2)
        .union(Self::LS3)
        .union(Self::LS4)
        .union(Self::LS5)
        .union(Self::LS6)
        .union(Self::LS7)
        .union(Self::LS8);

    /// Every cross-world linkshell channel.
    pub const CROSS_WORLD_LINKSHELLS: Self = Self::CWL1
        .union(Self::CWL2)
        .union(Self::CWL3)
        .union(Self::CWL4)
        .union(Self::CWL5)
        .union(Self::CWL6)
        .union(Self::CWL7)
        .union(Self::CWL8);

    /// The linkshell bit for a 1-based linkshell number.
    pub fn linkshell(number: u8) -> Option<Self> {
        match number {
            1..=8 => Self::from_bits(Self::LS1.bits() << (number - 1)),
            _ => None,
        }
    }

    /// The cross-world linkshell bit for a 1-based number.
    pub fn cross_world_linkshell(number: u8) -> Option<Self> {
        match number {
            1..=8 => Self::from_bits(Self::CWL1.bits() << (number - 1)),
            _ => None,
        }
    }
}
