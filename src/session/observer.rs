//! Presentation seam.
//!
//! A session reports everything user-visible through a [`SessionObserver`]:
//! a status bar, a webview or a statistics collector would each implement
//! it. Every method has an empty default.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::mode::Preset;
use crate::schedule::{ShiftDecision, WorkSchedule};
use crate::types::{ModeSettings, TimerPhase, TimerSettings, TimerState};

/// Pull view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub origin_id: String,
    pub state: TimerState,
    pub settings: TimerSettings,
    pub mode_enabled: bool,
    pub mode_settings: ModeSettings,
    pub active_preset: Option<String>,
    pub presets: Vec<Preset>,
    pub schedule: WorkSchedule,
    /// Next end of shift armed in this session
    pub next_shift_end: Option<NaiveDateTime>,
    /// This session owns an unanswered end-of-shift prompt
    pub prompt_pending: bool,
    /// This session waits for another participant's answer
    pub awaiting_claim: bool,
}

/// Receives session notifications.
pub trait SessionObserver {
    /// Timer state changed (local or remote).
    fn state_changed(&mut self, _state: &TimerState) {}

    /// One second elapsed on a running timer.
    fn tick(&mut self, _state: &TimerState) {}

    fn settings_changed(&mut self, _settings: &TimerSettings) {}

    fn mode_changed(&mut self, _enabled: bool, _settings: &ModeSettings) {}

    /// A phase completed in this process. Drives sound and the popup.
    fn phase_completed(&mut self, _completed: TimerPhase, _next: TimerPhase, _settings: &TimerSettings) {}

    /// A work session completed in this process. Drives statistics.
    fn work_session_completed(&mut self, _minutes: u32) {}

    /// This session owns the end-of-shift prompt and must ask the user.
    fn shift_prompt(&mut self) {}

    /// The end-of-shift question was settled; `None` means nobody answered.
    fn shift_resolved(&mut self, _decision: Option<&ShiftDecision>, _owned: bool) {}

    fn message(&mut self, _text: &str) {}

    fn status(&mut self, _snapshot: &SessionSnapshot) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

// ============================================================================
// RecordingObserver
// ============================================================================

/// A notification captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    StateChanged(TimerState),
    Tick(u32),
    SettingsChanged(TimerSettings),
    ModeChanged { enabled: bool, settings: ModeSettings },
    PhaseCompleted { completed: TimerPhase, next: TimerPhase },
    WorkSessionCompleted { minutes: u32 },
    ShiftPrompt,
    ShiftResolved { decision: Option<ShiftDecision>, owned: bool },
    Message(String),
    Status(Box<SessionSnapshot>),
}

/// Observer that records notifications. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Number of phase completions seen.
    pub fn completions(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::PhaseCompleted { .. }))
    }

    /// Minutes of every work session completed here.
    pub fn work_minutes(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::WorkSessionCompleted { minutes } => Some(minutes),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ObservedEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl SessionObserver for RecordingObserver {
    fn state_changed(&mut self, state: &TimerState) {
        self.push(ObservedEvent::StateChanged(state.clone()));
    }

    fn tick(&mut self, state: &TimerState) {
        self.push(ObservedEvent::Tick(state.time_remaining_seconds));
    }

    fn settings_changed(&mut self, settings: &TimerSettings) {
        self.push(ObservedEvent::SettingsChanged(settings.clone()));
    }

    fn mode_changed(&mut self, enabled: bool, settings: &ModeSettings) {
        self.push(ObservedEvent::ModeChanged {
            enabled,
            settings: *settings,
        });
    }

    fn phase_completed(&mut self, completed: TimerPhase, next: TimerPhase, _settings: &TimerSettings) {
        self.push(ObservedEvent::PhaseCompleted { completed, next });
    }

    fn work_session_completed(&mut self, minutes: u32) {
        self.push(ObservedEvent::WorkSessionCompleted { minutes });
    }

    fn shift_prompt(&mut self) {
        self.push(ObservedEvent::ShiftPrompt);
    }

    fn shift_resolved(&mut self, decision: Option<&ShiftDecision>, owned: bool) {
        self.push(ObservedEvent::ShiftResolved {
            decision: decision.cloned(),
            owned,
        });
    }

    fn message(&mut self, text: &str) {
        self.push(ObservedEvent::Message(text.to_string()));
    }

    fn status(&mut self, snapshot: &SessionSnapshot) {
        self.push(ObservedEvent::Status(Box::new(snapshot.clone())));
    }
}
