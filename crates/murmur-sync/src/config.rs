//! Protocol configuration.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Knobs for the replication protocol
///
/// The channel name and the optional initial value are per-instance inputs
/// and live outside this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Broadcast `hi` when a participant joins
    pub announce_on_join: bool,
    /// Answer `hi` with the current state when holding real state
    pub answer_announcements: bool,
    /// Inbound frames larger than this are dropped as malformed
    pub max_frame_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            announce_on_join: true,
            answer_announcements: true,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

impl SyncConfig {
    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| SyncError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    pub fn validate(&self) -> SyncResult<()> {
        if self.max_frame_bytes == 0 {
            return Err(SyncError::config("max_frame_bytes must be greater than zero"));
        }
        Ok(())
    }
}
