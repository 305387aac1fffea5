//! Action kinds: what a relayed action does to its targets.
//!
//! The payload of an action is opaque to the relay. The kind only decides
//! which permission bits a target must have granted and which cooldown
//! applies to the sender.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The kind of a one-shot relayed action.
///
/// The high byte encodes the cooldown category: `0x00xx` kinds are executed
/// through the game itself, `0x01xx` kinds are applied out of game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ActionKind {
    // In-game kinds (0x0000 - 0x00FF)
    /// Make the target say something in a chat channel.
    Speak = 0x0001,
    /// Make the target perform an emote.
    Emote = 0x0002,

    // Out-of-game kinds (0x0100 - 0x01FF)
    /// Apply appearance or equipment data to the target.
    Transform = 0x0100,
    /// Swap bodies between the sender and the targets.
    BodySwap = 0x0101,
    /// Make the targets look like the sender.
    Twinning = 0x0102,
    /// Apply status moodles.
    Moodles = 0x0103,
    /// Show a hypnosis spiral.
    Hypnosis = 0x0104,
    /// Set an honorific title.
    Honorific = 0x0105,
    /// Apply a body scaling profile.
    CustomizePlus = 0x0106,
}

/// Which sender cooldown an action is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CooldownCategory {
    /// Actions executed through game commands.
    InGame,
    /// Actions applied outside the game client's own command surface.
    OutOfGame,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Speak,
        ActionKind::Emote,
        ActionKind::Transform,
        ActionKind::BodySwap,
        ActionKind::Twinning,
        ActionKind::Moodles,
        ActionKind::Hypnosis,
        ActionKind::Honorific,
        ActionKind::CustomizePlus,
    ];

    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_u16() == value)
            .ok_or(CoreError::UnknownActionKind(value))
    }

    /// The cooldown category this kind counts against.
    pub fn category(self) -> CooldownCategory {
        if (self.to_u16() & 0xFF00) == 0x0000 {
            CooldownCategory::InGame
        } else {
            CooldownCategory::OutOfGame
        }
    }
}
