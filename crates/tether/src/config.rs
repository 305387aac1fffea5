//! Hub configuration.
//!
//! Every field has a default. The JSON form uses milliseconds for durations
//! and may omit any field:
//!
//! ```json
//! {
//!   "forward_timeout_ms": 8000,
//!   "in_game_cooldown_ms": 1000,
//!   "out_of_game_cooldown_ms": 250,
//!   "possession_queue_capacity": 8,
//!   "max_targets": 64,
//!   "max_payload_bytes": 65536
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context};
use serde::Deserialize;

use tether_core::limits;
use tether_relay::RelayConfig;

/// Configuration for the Hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Relay timing and queueing.
    pub relay: RelayConfig,
    /// Most targets one request may name.
    pub max_targets: usize,
    /// Largest payload one request may carry.
    pub max_payload_bytes: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            max_targets: limits::MAX_TARGETS,
            max_payload_bytes: limits::MAX_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    forward_timeout_ms: Option<u64>,
    in_game_cooldown_ms: Option<u64>,
    out_of_game_cooldown_ms: Option<u64>,
    possession_queue_capacity: Option<usize>,
    max_targets: Option<usize>,
    max_payload_bytes: Option<usize>,
}

impl HubConfig {
    /// Parse a JSON config, filling gaps with defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(json).context("malformed hub config")?;
        let mut config = Self::default();

        if let Some(ms) = file.forward_timeout_ms {
            config.relay.forward_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.in_game_cooldown_ms {
            config.relay.in_game_cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = file.out_of_game_cooldown_ms {
            config.relay.out_of_game_cooldown = Duration::from_millis(ms);
        }
        if let Some(capacity) = file.possession_queue_capacity {
            config.relay.possession_queue_capacity = capacity;
        }
        if let Some(max) = file.max_targets {
            config.max_targets = max;
        }
        if let Some(max) = file.max_payload_bytes {
            config.max_payload_bytes = max;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read hub config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Reject values the hub cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.relay.forward_timeout.is_zero(),
            "forward timeout must be positive"
        );
        ensure!(
            self.relay.possession_queue_capacity > 0,
            "possession queue capacity must be positive"
        );
        ensure!(self.max_targets > 0, "max_targets must be positive");
        Ok(())
    }
}
