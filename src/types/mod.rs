//! Core data types for the shared Pomodoro session.
//!
//! This module defines the data structures used for:
//! - Timer state and settings (mirrored, by copy, into every process)
//! - Focus-mode visibility settings
//! - Records exchanged through the shared directory

mod mode;
mod wire;

pub use mode::{ModeSettings, ToggleId};
pub use wire::{ClaimDecision, ClaimExtra, ClaimRecord, SyncAction, SyncEnvelope};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    /// No session has been started (or the cycle was reset)
    Idle,
    /// Currently in a work session
    Work,
    /// Currently in a short break
    Break,
    /// Currently in a long break
    LongBreak,
}

impl TimerPhase {
    /// Returns the wire representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Work => "work",
            TimerPhase::Break => "break",
            TimerPhase::LongBreak => "longBreak",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "Idle",
            TimerPhase::Work => "Work",
            TimerPhase::Break => "Break",
            TimerPhase::LongBreak => "Long Break",
        }
    }

    /// Returns true for either kind of break.
    pub fn is_break(&self) -> bool {
        matches!(self, TimerPhase::Break | TimerPhase::LongBreak)
    }
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ProgressBarPosition
// ============================================================================

/// Where the presentation layer draws the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBarPosition {
    Top,
    Bottom,
    Hidden,
}

impl ProgressBarPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressBarPosition::Top => "top",
            ProgressBarPosition::Bottom => "bottom",
            ProgressBarPosition::Hidden => "hidden",
        }
    }
}

impl Default for ProgressBarPosition {
    fn default() -> Self {
        ProgressBarPosition::Top
    }
}

impl FromStr for ProgressBarPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(ProgressBarPosition::Top),
            "bottom" => Ok(ProgressBarPosition::Bottom),
            "hidden" => Ok(ProgressBarPosition::Hidden),
            other => Err(format!("unknown progress bar position '{other}' (top, bottom, hidden)")),
        }
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

fn default_true() -> bool {
    true
}

/// Settings for the Pomodoro cycle.
///
/// Changed only through an explicit update; every change is broadcast to the
/// other processes like a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Work duration in minutes (1-120)
    pub work_minutes: u32,
    /// Short break duration in minutes (1-60)
    pub break_minutes: u32,
    /// Long break duration in minutes (1-60)
    pub long_break_minutes: u32,
    /// Whether the next phase keeps running after a phase completes
    pub auto_start: bool,
    /// Whether phase completion plays a sound
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Whether phase completion shows a notification
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Progress bar placement for the presentation layer
    #[serde(default)]
    pub progress_bar_position: ProgressBarPosition,
    /// Work sessions per cycle; the last one is followed by a long break (1-12)
    pub sessions_before_long_break: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            long_break_minutes: 15,
            auto_start: false,
            sound_enabled: true,
            notifications_enabled: true,
            progress_bar_position: ProgressBarPosition::Top,
            sessions_before_long_break: 4,
        }
    }
}

impl TimerSettings {
    /// Creates new settings with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates new settings with the specified break duration.
    pub fn with_break_minutes(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Creates new settings with the specified long break duration.
    pub fn with_long_break_minutes(mut self, minutes: u32) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Creates new settings with the specified auto-start flag.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Creates new settings with the specified cycle length.
    pub fn with_sessions_before_long_break(mut self, sessions: u32) -> Self {
        self.sessions_before_long_break = sessions;
        self
    }

    /// Length of a phase in seconds. `Idle` counts as the upcoming work phase.
    pub fn duration_seconds(&self, phase: TimerPhase) -> u32 {
        let minutes = match phase {
            TimerPhase::Idle | TimerPhase::Work => self.work_minutes,
            TimerPhase::Break => self.break_minutes,
            TimerPhase::LongBreak => self.long_break_minutes,
        };
        minutes * 60
    }

    /// Validates the settings.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.work_minutes < 1 || self.work_minutes > 120 {
            return Err("work duration must be between 1 and 120 minutes".to_string());
        }
        if self.break_minutes < 1 || self.break_minutes > 60 {
            return Err("break duration must be between 1 and 60 minutes".to_string());
        }
        if self.long_break_minutes < 1 || self.long_break_minutes > 60 {
            return Err("long break duration must be between 1 and 60 minutes".to_string());
        }
        if self.sessions_before_long_break < 1 || self.sessions_before_long_break > 12 {
            return Err("sessions before a long break must be between 1 and 12".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Snapshot of the timer.
///
/// Invariants: `time_remaining_seconds <= total_seconds`, and an idle timer
/// is never running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Current phase of the timer
    pub phase: TimerPhase,
    /// Remaining seconds in the current phase
    pub time_remaining_seconds: u32,
    /// Full length of the current phase in seconds
    pub total_seconds: u32,
    /// Whether the countdown is advancing
    pub is_running: bool,
    /// Work sessions completed since the last reset
    pub completed_work_sessions: u32,
    /// Work sessions left before the next long break
    pub sessions_until_long_break: u32,
}

impl TimerState {
    /// Creates the idle state for the given settings.
    pub fn idle(settings: &TimerSettings) -> Self {
        let total = settings.duration_seconds(TimerPhase::Idle);
        Self {
            phase: TimerPhase::Idle,
            time_remaining_seconds: total,
            total_seconds: total,
            is_running: false,
            completed_work_sessions: 0,
            sessions_until_long_break: settings.sessions_before_long_break,
        }
    }

    /// Returns true if the timer has not been started.
    pub fn is_idle(&self) -> bool {
        self.phase == TimerPhase::Idle
    }

    /// Elapsed share of the current phase, 0.0 to 100.0.
    pub fn progress_percent(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let elapsed = self.total_seconds.saturating_sub(self.time_remaining_seconds);
        f64::from(elapsed) / f64::from(self.total_seconds) * 100.0
    }

    /// Restores the invariants on a state that came from outside the process.
    pub fn normalized(mut self) -> Self {
        if self.total_seconds == 0 {
            self.total_seconds = self.time_remaining_seconds.max(1);
        }
        if self.time_remaining_seconds > self.total_seconds {
            self.time_remaining_seconds = self.total_seconds;
        }
        if self.phase == TimerPhase::Idle {
            self.is_running = false;
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
