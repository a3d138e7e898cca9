//! Tuning values for the shared-directory protocols.
//!
//! The constants are tuning choices. What matters is their order:
//! a poll must land well inside the broadcast window, and a claim must
//! outlive many broadcasts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Name of the optional tuning file inside the shared directory.
pub const CONFIG_FILE: &str = "config.json";

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_broadcast_stale_ms() -> u64 {
    60_000
}

fn default_claim_stale_ms() -> u64 {
    5 * 60_000
}

fn default_resolved_linger_ms() -> u64 {
    5_000
}

fn default_watch_enabled() -> bool {
    true
}

/// Timing configuration shared by the broadcast channel and claim coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Poll cadence for both slots
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Envelopes older than this are never dispatched
    #[serde(default = "default_broadcast_stale_ms")]
    pub broadcast_stale_ms: u64,

    /// Unresolved claims older than this are abandoned
    #[serde(default = "default_claim_stale_ms")]
    pub claim_stale_ms: u64,

    /// Resolved claims older than this belong to a previous round
    #[serde(default = "default_resolved_linger_ms")]
    pub resolved_linger_ms: u64,

    /// Use filesystem change notifications in addition to polling
    #[serde(default = "default_watch_enabled")]
    pub watch_enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            broadcast_stale_ms: default_broadcast_stale_ms(),
            claim_stale_ms: default_claim_stale_ms(),
            resolved_linger_ms: default_resolved_linger_ms(),
            watch_enabled: default_watch_enabled(),
        }
    }
}

impl SyncConfig {
    /// Returns a copy with a different poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Returns a copy with change notifications switched on or off.
    #[must_use]
    pub fn with_watch_enabled(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Checks `poll < broadcastStale < claimStale` and the linger bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("pollIntervalMs"));
        }
        if self.poll_interval_ms >= self.broadcast_stale_ms {
            return Err(ConfigError::Ordering {
                smaller: "pollIntervalMs",
                smaller_ms: self.poll_interval_ms,
                larger: "broadcastStaleMs",
                larger_ms: self.broadcast_stale_ms,
            });
        }
        if self.broadcast_stale_ms >= self.claim_stale_ms {
            return Err(ConfigError::Ordering {
                smaller: "broadcastStaleMs",
                smaller_ms: self.broadcast_stale_ms,
                larger: "claimStaleMs",
                larger_ms: self.claim_stale_ms,
            });
        }
        if self.resolved_linger_ms < self.poll_interval_ms.saturating_mul(2) {
            return Err(ConfigError::LingerTooShort {
                linger_ms: self.resolved_linger_ms,
                poll_ms: self.poll_interval_ms,
            });
        }
        Ok(())
    }

    /// Loads `config.json` from the shared directory.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is
    /// an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid timing in {}", path.display()))?;
        Ok(config)
    }
}

/// Default shared directory: the platform data directory, else `~/.pomosync`.
pub fn default_shared_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("pomosync"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".pomosync")))
        .unwrap_or_else(|| PathBuf::from(".pomosync"))
}
