//! Relay timing and queueing knobs.

use std::time::Duration;

use tether_core::CooldownCategory;

/// Configuration for relay behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Deadline for one forwarded call to one target.
    pub forward_timeout: Duration,
    /// Minimum gap between a sender's in-game actions.
    pub in_game_cooldown: Duration,
    /// Minimum gap between a sender's out-of-game actions.
    pub out_of_game_cooldown: Duration,
    /// Possession frames buffered per session before the oldest are dropped.
    pub possession_queue_capacity: usize,
}

impl RelayConfig {
    /// Cooldown for a category.
    pub fn cooldown(&self, category: CooldownCategory) -> Duration {
        match category {
            CooldownCategory::InGame => self.in_game_cooldown,
            CooldownCategory::OutOfGame => self.out_of_game_cooldown,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            forward_timeout: Duration::from_secs(8),
            in_game_cooldown: Duration::from_secs(1),
            out_of_game_cooldown: Duration::from_millis(250),
            possession_queue_capacity: 8,
        }
    }
}
