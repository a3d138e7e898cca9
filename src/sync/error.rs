//! Shared-directory error types.
//!
//! Nothing here is fatal to a participant: callers log these and fall back
//! to independent, local operation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the shared directory.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading, writing or removing a slot file failed.
    #[error("shared slot I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to encode shared record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The change notifier could not be started.
    #[error("change notifications unavailable: {0}")]
    WatcherUnavailable(String),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-facing hint for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Io { .. } => "check that the shared directory exists and is writable",
            Self::Encode(_) => "report this as a bug",
            Self::WatcherUnavailable(_) => {
                "changes are still picked up by polling; raise the inotify watch limit to restore instant updates"
            }
        }
    }
}

/// Errors in the tuning values of [`super::SyncConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Two values were in the wrong order.
    #[error("{smaller} ({smaller_ms} ms) must be less than {larger} ({larger_ms} ms)")]
    Ordering {
        smaller: &'static str,
        smaller_ms: u64,
        larger: &'static str,
        larger_ms: u64,
    },

    /// Resolved claims would vanish before slower pollers could see them.
    #[error("resolvedLingerMs ({linger_ms} ms) must be at least twice pollIntervalMs ({poll_ms} ms)")]
    LingerTooShort { linger_ms: u64, poll_ms: u64 },
}
