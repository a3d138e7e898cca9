//! Best-effort persistence of participant state.
//!
//! Participants in one shared directory share two files. `timer.json` holds
//! the timer settings and state, which every participant converges on
//! through the broadcast slot, so whoever saves last is as good as anyone.
//! `preferences.json` holds focus mode, custom presets and the work
//! schedule. Presets and the schedule are never broadcast, so that file is
//! only ever rewritten field by field on top of what is on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mode::Preset;
use crate::schedule::WorkSchedule;
use crate::sync::{SharedSlot, SyncError};
use crate::types::{ModeSettings, TimerSettings, TimerState};

/// File name of the saved timer inside the shared directory.
pub const TIMER_FILE: &str = "timer.json";

/// File name of the saved preferences inside the shared directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Timer settings and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedTimer {
    pub settings: TimerSettings,
    /// Absent until a timer state has been saved
    pub state: Option<TimerState>,
}

/// Focus mode, presets and the work schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub mode_enabled: bool,
    pub mode_settings: ModeSettings,
    pub custom_presets: Vec<Preset>,
    pub active_preset_id: Option<String>,
    pub schedule: WorkSchedule,
}

/// Everything a participant restores on start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub settings: TimerSettings,
    pub state: Option<TimerState>,
    pub mode_enabled: bool,
    pub mode_settings: ModeSettings,
    pub custom_presets: Vec<Preset>,
    pub active_preset_id: Option<String>,
    pub schedule: WorkSchedule,
}

impl PersistedState {
    fn from_parts(timer: SavedTimer, preferences: Preferences) -> Self {
        Self {
            settings: timer.settings,
            state: timer.state,
            mode_enabled: preferences.mode_enabled,
            mode_settings: preferences.mode_settings,
            custom_presets: preferences.custom_presets,
            active_preset_id: preferences.active_preset_id,
            schedule: preferences.schedule,
        }
    }
}

/// Reads and writes `timer.json` and `preferences.json`.
#[derive(Debug, Clone)]
pub struct StateStore {
    timer: SharedSlot,
    preferences: SharedSlot,
}

impl StateStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            timer: SharedSlot::new(dir.join(TIMER_FILE)),
            preferences: SharedSlot::new(dir.join(PREFERENCES_FILE)),
        }
    }

    /// Loads both files. Missing or malformed files yield defaults.
    pub fn load(&self) -> PersistedState {
        PersistedState::from_parts(self.load_timer(), self.load_preferences())
    }

    /// Loads the saved timer; out-of-range settings are replaced by the
    /// defaults and the saved state is dropped with them.
    pub fn load_timer(&self) -> SavedTimer {
        let mut timer = self.timer.read::<SavedTimer>().unwrap_or_default();
        if let Err(reason) = timer.settings.validate() {
            tracing::warn!(%reason, "saved timer settings out of range, using defaults");
            timer = SavedTimer::default();
        }
        timer
    }

    /// Loads the saved preferences; an invalid schedule is replaced by the
    /// default one.
    pub fn load_preferences(&self) -> Preferences {
        let mut preferences = self.preferences.read::<Preferences>().unwrap_or_default();
        if let Err(reason) = preferences.schedule.validate() {
            tracing::warn!(%reason, "saved work schedule invalid, using defaults");
            preferences.schedule = WorkSchedule::default();
        }
        preferences
    }

    /// Writes the timer file atomically.
    pub fn save_timer(&self, timer: &SavedTimer) -> Result<(), SyncError> {
        self.timer.write(timer)
    }

    /// Re-reads the preferences, applies `update` and writes them back.
    ///
    /// Fields `update` leaves alone keep whatever another participant saved.
    pub fn update_preferences(
        &self,
        update: impl FnOnce(&mut Preferences),
    ) -> Result<Preferences, SyncError> {
        let mut preferences = self.load_preferences();
        update(&mut preferences);
        self.preferences.write(&preferences)?;
        Ok(preferences)
    }

    pub fn timer_path(&self) -> &Path {
        self.timer.path()
    }

    pub fn preferences_path(&self) -> &Path {
        self.preferences.path()
    }
}
