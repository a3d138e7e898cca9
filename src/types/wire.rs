//! Records written to the shared directory.
//!
//! Both records are plain JSON so that any participant (or a human with
//! `cat`) can read them.

use serde::{Deserialize, Serialize};

use super::{ModeSettings, TimerSettings, TimerState, ToggleId};

// ============================================================================
// SyncAction
// ============================================================================

/// One state change carried by a broadcast envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncAction {
    /// Timer started or resumed
    TimerStart {
        state: TimerState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<TimerSettings>,
    },
    /// Timer paused
    TimerPause { state: TimerState },
    /// Phase skipped (or completed) by a user action
    TimerSkip {
        state: TimerState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<TimerSettings>,
    },
    /// Timer reset to idle; receivers rebuild idle from their own settings
    TimerReset,
    /// Timer settings changed
    TimerSettingsChanged { settings: TimerSettings },
    /// Focus mode switched on
    ModeEnabled { settings: ModeSettings },
    /// Focus mode switched off
    ModeDisabled { settings: ModeSettings },
    /// One focus-mode flag changed
    ModeToggleChanged {
        toggle_id: ToggleId,
        value: bool,
        settings: ModeSettings,
    },
    /// A preset replaced the focus-mode flags and enabled the mode
    PresetApplied { settings: ModeSettings },
}

impl SyncAction {
    /// Returns the wire tag of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncAction::TimerStart { .. } => "timerStart",
            SyncAction::TimerPause { .. } => "timerPause",
            SyncAction::TimerSkip { .. } => "timerSkip",
            SyncAction::TimerReset => "timerReset",
            SyncAction::TimerSettingsChanged { .. } => "timerSettingsChanged",
            SyncAction::ModeEnabled { .. } => "modeEnabled",
            SyncAction::ModeDisabled { .. } => "modeDisabled",
            SyncAction::ModeToggleChanged { .. } => "modeToggleChanged",
            SyncAction::PresetApplied { .. } => "presetApplied",
        }
    }
}

// ============================================================================
// SyncEnvelope
// ============================================================================

/// The sole content of the broadcast slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEnvelope {
    /// Publishing process
    pub origin_id: String,
    /// Strictly increasing per origin
    pub sequence: u64,
    /// Wall-clock publish time in Unix milliseconds
    pub timestamp_ms: u64,
    pub action: SyncAction,
}

impl SyncEnvelope {
    /// Age of the envelope at `now_ms`. A timestamp from the future counts as 0.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }

    /// Returns true while the envelope is younger than `window_ms`.
    pub fn is_fresh(&self, now_ms: u64, window_ms: u64) -> bool {
        self.age_ms(now_ms) < window_ms
    }
}

// ============================================================================
// ClaimRecord
// ============================================================================

/// Outcome written by the owner of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimDecision {
    ProceedA,
    ProceedB,
    Dismiss,
}

impl ClaimDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimDecision::ProceedA => "proceedA",
            ClaimDecision::ProceedB => "proceedB",
            ClaimDecision::Dismiss => "dismiss",
        }
    }
}

/// Structured payload attached to a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimExtra {
    /// Chosen time of day, `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl ClaimExtra {
    pub fn with_end_time(end_time: impl Into<String>) -> Self {
        Self {
            end_time: Some(end_time.into()),
        }
    }
}

/// The sole content of the claim slot.
///
/// `decision == None` means the claim is held but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub claimed_at_ms: u64,
    #[serde(default)]
    pub decision: Option<ClaimDecision>,
    #[serde(default)]
    pub extra: Option<ClaimExtra>,
}

impl ClaimRecord {
    /// A fresh, unanswered claim.
    pub fn claim(now_ms: u64) -> Self {
        Self {
            claimed_at_ms: now_ms,
            decision: None,
            extra: None,
        }
    }

    /// A resolved record, stamped at resolution time.
    pub fn resolved(now_ms: u64, decision: ClaimDecision, extra: Option<ClaimExtra>) -> Self {
        Self {
            claimed_at_ms: now_ms,
            decision: Some(decision),
            extra,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.decision.is_some()
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.claimed_at_ms)
    }
}
