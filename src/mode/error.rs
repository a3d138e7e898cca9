//! Focus mode error types.
//!
//! Applying visibility changes is best effort. These errors are logged and
//! never stop focus mode from changing state.

use thiserror::Error;

use crate::types::ToggleId;

/// Errors reported by a [`super::ModeApplier`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    /// The editor refused one element change.
    #[error("failed to apply '{toggle}': {reason}")]
    ToggleRejected { toggle: ToggleId, reason: String },

    /// The editor settings could not be reached at all.
    #[error("editor settings unavailable: {0}")]
    Unavailable(String),
}

impl ModeError {
    /// Returns true if only a single element was affected.
    #[must_use]
    pub fn is_toggle_rejected(&self) -> bool {
        matches!(self, Self::ToggleRejected { .. })
    }
}
