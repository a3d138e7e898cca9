//! Seam to the editor-settings toggler.
//!
//! The core decides *what* should be visible; an applier makes it so.
//! This crate ships a logging applier and a recording mock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::error::ModeError;
use crate::types::{ModeSettings, ToggleId};

/// Applies focus-mode visibility to the editor.
pub trait ModeApplier {
    /// Remembers the current editor settings and hides what `settings` hides.
    fn enable(&mut self, settings: &ModeSettings) -> Result<(), ModeError>;

    /// Restores the settings remembered by [`ModeApplier::enable`].
    fn disable(&mut self) -> Result<(), ModeError>;

    /// Re-applies every flag while the mode stays enabled.
    fn apply_all(&mut self, settings: &ModeSettings) -> Result<(), ModeError>;

    /// Applies a single flag while the mode is enabled.
    fn apply_toggle(&mut self, id: ToggleId, show: bool) -> Result<(), ModeError>;
}

// ============================================================================
// LoggingModeApplier
// ============================================================================

/// Applier that only logs the intended changes.
#[derive(Debug, Default)]
pub struct LoggingModeApplier;

impl ModeApplier for LoggingModeApplier {
    fn enable(&mut self, settings: &ModeSettings) -> Result<(), ModeError> {
        tracing::info!(visible = ?settings.visible(), "focus mode on");
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ModeError> {
        tracing::info!("focus mode off, editor settings restored");
        Ok(())
    }

    fn apply_all(&mut self, settings: &ModeSettings) -> Result<(), ModeError> {
        tracing::info!(visible = ?settings.visible(), "focus mode settings re-applied");
        Ok(())
    }

    fn apply_toggle(&mut self, id: ToggleId, show: bool) -> Result<(), ModeError> {
        tracing::info!(toggle = %id, show, "focus mode element changed");
        Ok(())
    }
}

// ============================================================================
// MockModeApplier
// ============================================================================

/// A call received by [`MockModeApplier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplierCall {
    Enable(ModeSettings),
    Disable,
    ApplyAll(ModeSettings),
    ApplyToggle(ToggleId, bool),
}

/// Applier that records calls. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MockModeApplier {
    calls: Arc<Mutex<Vec<ApplierCall>>>,
    fail: Arc<AtomicBool>,
}

impl MockModeApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApplierCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: ApplierCall) -> Result<(), ModeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ModeError::Unavailable("mock failure".to_string()));
        }
        Ok(())
    }
}

impl ModeApplier for MockModeApplier {
    fn enable(&mut self, settings: &ModeSettings) -> Result<(), ModeError> {
        self.record(ApplierCall::Enable(*settings))
    }

    fn disable(&mut self) -> Result<(), ModeError> {
        self.record(ApplierCall::Disable)
    }

    fn apply_all(&mut self, settings: &ModeSettings) -> Result<(), ModeError> {
        self.record(ApplierCall::ApplyAll(*settings))
    }

    fn apply_toggle(&mut self, id: ToggleId, show: bool) -> Result<(), ModeError> {
        self.record(ApplierCall::ApplyToggle(id, show))
    }
}
