//! Focus mode state.

use tokio::sync::mpsc;

use super::applier::ModeApplier;
use super::error::ModeError;
use crate::types::{ModeSettings, ToggleId};

/// Focus mode notifications for presentation and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    /// Mode switched on or off
    StateChanged { enabled: bool },
    /// Visibility flags replaced or changed
    SettingsChanged(ModeSettings),
}

/// One participant's focus mode.
///
/// State changes always happen; applier failures are only logged.
pub struct FocusMode {
    enabled: bool,
    settings: ModeSettings,
    applier: Box<dyn ModeApplier>,
    event_tx: mpsc::UnboundedSender<ModeEvent>,
}

impl FocusMode {
    pub fn new(
        enabled: bool,
        settings: ModeSettings,
        applier: Box<dyn ModeApplier>,
        event_tx: mpsc::UnboundedSender<ModeEvent>,
    ) -> Self {
        Self {
            enabled,
            settings,
            applier,
            event_tx,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &ModeSettings {
        &self.settings
    }

    /// Switches the mode on. Returns false if it already was.
    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        report(self.applier.enable(&self.settings));
        self.enabled = true;
        self.emit(ModeEvent::StateChanged { enabled: true });
        true
    }

    /// Switches the mode off. Returns false if it already was.
    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        report(self.applier.disable());
        self.enabled = false;
        self.emit(ModeEvent::StateChanged { enabled: false });
        true
    }

    pub fn toggle(&mut self) {
        if self.enabled {
            self.disable();
        } else {
            self.enable();
        }
    }

    /// Changes one flag, applying it at once while the mode is on.
    pub fn update_toggle(&mut self, id: ToggleId, show: bool) {
        self.settings.set(id, show);
        self.emit(ModeEvent::SettingsChanged(self.settings));

        if self.enabled {
            report(self.applier.apply_toggle(id, show));
        }
    }

    /// Replaces every flag, re-applying while the mode is on.
    pub fn apply_settings(&mut self, settings: ModeSettings) {
        self.settings = settings;
        self.emit(ModeEvent::SettingsChanged(self.settings));

        if self.enabled {
            report(self.applier.apply_all(&self.settings));
        }
    }

    /// Adopts another participant's mode state.
    pub fn sync_state(&mut self, enabled: bool, settings: ModeSettings) {
        self.settings = settings;
        self.emit(ModeEvent::SettingsChanged(self.settings));

        match (enabled, self.enabled) {
            (true, false) => {
                self.enable();
            }
            (false, true) => {
                self.disable();
            }
            (true, true) => report(self.applier.apply_all(&self.settings)),
            (false, false) => {}
        }
    }

    fn emit(&self, event: ModeEvent) {
        let _ = self.event_tx.send(event);
    }
}

fn report(result: Result<(), ModeError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_toggle_rejected() => {
            tracing::debug!(error = %e, "editor element left unchanged");
        }
        Err(e) => tracing::warn!(error = %e, "focus mode change not applied"),
    }
}

impl std::fmt::Debug for FocusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusMode")
            .field("enabled", &self.enabled)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
