//! Timer engine for the shared Pomodoro session.
//!
//! This module provides the timer state machine:
//! - State transitions (Idle → Work → Break/LongBreak → Work → ...)
//! - One-second countdown driven by the session loop
//! - Event firing for presentation, sound and statistics
//! - Remote application without completion side effects

use tokio::sync::mpsc;

use crate::types::{TimerPhase, TimerSettings, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for presentation and local side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The state changed other than by a countdown step
    StateChanged(TimerState),
    /// One second elapsed
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Settings replaced
    SettingsChanged(TimerSettings),
    /// A phase completed here (sound and popup). Never sent for remote state.
    PhaseCompleted {
        completed: TimerPhase,
        next: TimerPhase,
    },
    /// A work session completed here (statistics). Never sent for remote state.
    WorkSessionCompleted {
        /// Length of the completed session
        minutes: u32,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns one participant's copy of the timer.
///
/// No operation fails. Operations that change nothing return `false`.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Current settings
    settings: TimerSettings,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine with the given settings and event channel.
    pub fn new(settings: TimerSettings, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let state = TimerState::idle(&settings);
        Self {
            state,
            settings,
            event_tx,
        }
    }

    /// Creates an engine from a persisted state.
    ///
    /// A timer that was running when the state was saved comes back paused.
    pub fn with_state(
        settings: TimerSettings,
        state: TimerState,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let mut state = state.normalized();
        state.is_running = false;
        Self {
            state,
            settings,
            event_tx,
        }
    }

    /// Returns the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Starts or resumes the countdown. Starting from idle enters work.
    pub fn start(&mut self) -> bool {
        if self.state.is_running {
            return false;
        }

        if self.state.phase == TimerPhase::Idle {
            self.enter_phase(TimerPhase::Work);
        }
        self.state.is_running = true;
        self.emit_state();
        true
    }

    /// Pauses the countdown, keeping the phase and remaining time.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }

        self.state.is_running = false;
        self.emit_state();
        true
    }

    /// Pauses a running timer, otherwise starts it.
    pub fn toggle(&mut self) -> bool {
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Returns true if the phase completed on this tick.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }

        self.state.time_remaining_seconds = self.state.time_remaining_seconds.saturating_sub(1);
        if self.state.time_remaining_seconds > 0 {
            self.emit(TimerEvent::Tick {
                remaining_seconds: self.state.time_remaining_seconds,
            });
            return false;
        }

        self.complete_phase();
        true
    }

    /// Completes the current phase regardless of remaining time.
    pub fn skip(&mut self) {
        self.complete_phase();
    }

    /// Advances to the next phase and fires the local completion events.
    pub fn complete_phase(&mut self) {
        let completed = self.state.phase;

        let next = match completed {
            TimerPhase::Work => {
                self.state.completed_work_sessions += 1;
                self.state.sessions_until_long_break =
                    self.state.sessions_until_long_break.saturating_sub(1);
                self.emit(TimerEvent::WorkSessionCompleted {
                    minutes: self.settings.work_minutes,
                });

                if self.state.sessions_until_long_break == 0 {
                    self.state.sessions_until_long_break = self.settings.sessions_before_long_break;
                    TimerPhase::LongBreak
                } else {
                    TimerPhase::Break
                }
            }
            TimerPhase::Break | TimerPhase::LongBreak | TimerPhase::Idle => TimerPhase::Work,
        };
        self.enter_phase(next);

        if !self.settings.auto_start {
            self.state.is_running = false;
        }

        tracing::debug!(%completed, %next, running = self.state.is_running, "phase completed");
        self.emit(TimerEvent::PhaseCompleted { completed, next });
        self.emit_state();
    }

    /// Returns to idle and restarts the long-break cycle.
    pub fn reset(&mut self) {
        self.state = TimerState::idle(&self.settings);
        self.emit_state();
    }

    /// Replaces the settings.
    ///
    /// An idle timer picks up the new work length and cycle length at once.
    ///
    /// # Errors
    ///
    /// Returns the validation message if the settings are out of range.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Result<(), String> {
        settings.validate()?;
        self.replace_settings(settings);
        Ok(())
    }

    /// Adopts another participant's state (and settings, if given).
    ///
    /// Completion events are never fired here: the participant that made the
    /// change already fired them.
    pub fn apply_remote(&mut self, state: TimerState, settings: Option<TimerSettings>) {
        if let Some(settings) = settings {
            if self.accept_remote_settings(&settings) {
                self.settings = settings;
                self.emit(TimerEvent::SettingsChanged(self.settings.clone()));
            }
        }

        self.state = state.normalized();
        self.emit_state();
    }

    /// Applies a remote reset: idle under this participant's own settings.
    pub fn apply_remote_reset(&mut self) {
        self.reset();
    }

    /// Adopts another participant's settings.
    pub fn apply_remote_settings(&mut self, settings: TimerSettings) {
        if self.accept_remote_settings(&settings) {
            self.replace_settings(settings);
        }
    }

    fn accept_remote_settings(&self, settings: &TimerSettings) -> bool {
        match settings.validate() {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(%reason, "ignoring remote settings");
                false
            }
        }
    }

    fn replace_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        self.emit(TimerEvent::SettingsChanged(self.settings.clone()));

        if self.state.is_idle() {
            self.state = TimerState {
                completed_work_sessions: self.state.completed_work_sessions,
                ..TimerState::idle(&self.settings)
            };
            self.emit_state();
        }
    }

    fn enter_phase(&mut self, phase: TimerPhase) {
        let total = self.settings.duration_seconds(phase);
        self.state.phase = phase;
        self.state.time_remaining_seconds = total;
        self.state.total_seconds = total;
    }

    fn emit_state(&self) {
        self.emit(TimerEvent::StateChanged(self.state.clone()));
    }

    fn emit(&self, event: TimerEvent) {
        // A closed receiver only means the session is shutting down.
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_engine() -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        create_engine_with_settings(TimerSettings::default())
    }

    fn create_engine_with_settings(
        settings: TimerSettings,
    ) -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(settings, tx);
        (engine, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn has_completion_events(events: &[TimerEvent]) -> bool {
        events.iter().any(|e| {
            matches!(
                e,
                TimerEvent::PhaseCompleted { .. } | TimerEvent::WorkSessionCompleted { .. }
            )
        })
    }

    // ------------------------------------------------------------------------
    // Start / Pause Tests
    // ------------------------------------------------------------------------

    mod start_pause_tests {
        use super::*;

        #[test]
        fn test_new_engine_is_idle() {
            let (engine, _rx) = create_engine();
            let state = engine.state();

            assert_eq!(state.phase, TimerPhase::Idle);
            assert_eq!(state.time_remaining_seconds, 25 * 60);
            assert!(!state.is_running);
        }

        #[test]
        fn test_start_from_idle_enters_work() {
            let (mut engine, mut rx) = create_engine();

            assert!(engine.start());

            let state = engine.state();
            assert_eq!(state.phase, TimerPhase::Work);
            assert_eq!(state.time_remaining_seconds, 25 * 60);
            assert_eq!(state.total_seconds, 25 * 60);
            assert!(state.is_running);

            let event = rx.try_recv().unwrap();
            assert_eq!(event, TimerEvent::StateChanged(state.clone()));
        }

        #[test]
        fn test_start_when_running_is_noop() {
            let (mut engine, mut rx) = create_engine();
            engine.start();
            drain(&mut rx);

            assert!(!engine.start());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_pause_keeps_phase_and_time() {
            let (mut engine, _rx) = create_engine();
            engine.start();
            engine.tick();
            engine.tick();

            assert!(engine.pause());
            let state = engine.state();
            assert_eq!(state.phase, TimerPhase::Work);
            assert_eq!(state.time_remaining_seconds, 25 * 60 - 2);
            assert!(!state.is_running);
        }

        #[test]
        fn test_pause_not_running_is_noop() {
            let (mut engine, mut rx) = create_engine();
            assert!(!engine.pause());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_start_resumes_break_without_resetting_time() {
            let settings = TimerSettings::default().with_auto_start(false);
            let (mut engine, _rx) = create_engine_with_settings(settings);
            engine.start();
            engine.skip();
            engine.start();
            engine.tick();
            engine.pause();

            engine.start();
            assert_eq!(engine.state().phase, TimerPhase::Break);
            assert_eq!(engine.state().time_remaining_seconds, 5 * 60 - 1);
        }

        #[test]
        fn test_toggle() {
            let (mut engine, _rx) = create_engine();
            engine.toggle();
            assert!(engine.state().is_running);
            engine.toggle();
            assert!(!engine.state().is_running);
        }
    }

    // ------------------------------------------------------------------------
    // Tick Tests
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[test]
        fn test_tick_when_paused_does_nothing() {
            let (mut engine, mut rx) = create_engine();
            assert!(!engine.tick());
            assert_eq!(engine.state().time_remaining_seconds, 25 * 60);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_countdown_is_monotonic_and_completes_once() {
            let settings = TimerSettings::default().with_work_minutes(1);
            let (mut engine, mut rx) = create_engine_with_settings(settings);
            engine.start();

            let mut previous = engine.state().time_remaining_seconds;
            let mut completions = 0;
            for _ in 0..60 {
                if engine.tick() {
                    completions += 1;
                } else {
                    let now = engine.state().time_remaining_seconds;
                    assert!(now < previous);
                    previous = now;
                }
            }

            assert_eq!(completions, 1);
            assert_eq!(engine.state().phase, TimerPhase::Break);

            let events = drain(&mut rx);
            let completed = events
                .iter()
                .filter(|e| matches!(e, TimerEvent::PhaseCompleted { .. }))
                .count();
            assert_eq!(completed, 1);
        }

        #[test]
        fn test_tick_event_carries_remaining_time() {
            let (mut engine, mut rx) = create_engine();
            engine.start();
            drain(&mut rx);

            engine.tick();
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Tick {
                    remaining_seconds: 25 * 60 - 1
                }
            );
        }

        #[test]
        fn test_running_state_at_zero_completes_on_next_tick() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut state = TimerState::idle(&TimerSettings::default());
            state.phase = TimerPhase::Work;
            state.time_remaining_seconds = 0;
            let mut engine = TimerEngine::new(TimerSettings::default(), tx);
            engine.apply_remote(
                TimerState {
                    is_running: true,
                    ..state
                },
                None,
            );

            assert!(engine.tick());
            assert_eq!(engine.state().phase, TimerPhase::Break);
        }
    }

    // ------------------------------------------------------------------------
    // Phase Completion Tests
    // ------------------------------------------------------------------------

    mod complete_phase_tests {
        use super::*;

        #[test]
        fn test_full_cycle_without_auto_start() {
            let (mut engine, _rx) = create_engine();

            engine.start();
            let mut phases = vec![engine.state().phase];
            for _ in 0..7 {
                engine.skip();
                assert!(!engine.state().is_running);
                phases.push(engine.state().phase);
            }

            assert_eq!(
                phases,
                vec![
                    TimerPhase::Work,
                    TimerPhase::Break,
                    TimerPhase::Work,
                    TimerPhase::Break,
                    TimerPhase::Work,
                    TimerPhase::Break,
                    TimerPhase::Work,
                    TimerPhase::LongBreak,
                ]
            );
            assert_eq!(engine.state().completed_work_sessions, 4);
            assert_eq!(engine.state().sessions_until_long_break, 4);
            assert_eq!(engine.state().total_seconds, 15 * 60);
        }

        #[test]
        fn test_long_break_boundary_is_one_to_zero() {
            let (mut engine, _rx) = create_engine();
            engine.start();

            engine.state.sessions_until_long_break = 2;
            engine.skip();
            assert_eq!(engine.state().phase, TimerPhase::Break);
            assert_eq!(engine.state().sessions_until_long_break, 1);

            engine.skip();
            engine.skip();
            assert_eq!(engine.state().phase, TimerPhase::LongBreak);
        }

        #[test]
        fn test_exhausted_counter_still_yields_long_break() {
            let (mut engine, _rx) = create_engine();
            engine.start();
            engine.state.sessions_until_long_break = 0;

            engine.skip();
            assert_eq!(engine.state().phase, TimerPhase::LongBreak);
            assert_eq!(engine.state().sessions_until_long_break, 4);
        }

        #[test]
        fn test_work_completion_reports_minutes() {
            let settings = TimerSettings::default().with_work_minutes(50);
            let (mut engine, mut rx) = create_engine_with_settings(settings);
            engine.start();
            drain(&mut rx);

            engine.skip();
            let events = drain(&mut rx);
            assert!(events.contains(&TimerEvent::WorkSessionCompleted { minutes: 50 }));
            assert!(events.contains(&TimerEvent::PhaseCompleted {
                completed: TimerPhase::Work,
                next: TimerPhase::Break,
            }));
        }

        #[test]
        fn test_break_completion_does_not_count_work() {
            let (mut engine, mut rx) = create_engine();
            engine.start();
            engine.skip();
            drain(&mut rx);

            engine.skip();
            let events = drain(&mut rx);
            assert_eq!(engine.state().phase, TimerPhase::Work);
            assert!(!events
                .iter()
                .any(|e| matches!(e, TimerEvent::WorkSessionCompleted { .. })));
        }

        #[test]
        fn test_skip_from_idle_enters_work() {
            let (mut engine, _rx) = create_engine();
            engine.skip();
            assert_eq!(engine.state().phase, TimerPhase::Work);
            assert!(!engine.state().is_running);
        }

        #[test]
        fn test_auto_start_keeps_running() {
            let settings = TimerSettings::default().with_auto_start(true);
            let (mut engine, _rx) = create_engine_with_settings(settings);
            engine.start();

            engine.skip();
            assert_eq!(engine.state().phase, TimerPhase::Break);
            assert!(engine.state().is_running);
        }
    }

    // ------------------------------------------------------------------------
    // Reset / Settings Tests
    // ------------------------------------------------------------------------

    mod reset_settings_tests {
        use super::*;

        #[test]
        fn test_reset_returns_to_idle() {
            let (mut engine, _rx) = create_engine();
            engine.start();
            engine.skip();
            engine.start();

            engine.reset();
            assert_eq!(*engine.state(), TimerState::idle(&TimerSettings::default()));
        }

        #[test]
        fn test_update_settings_rederives_idle_durations() {
            let (mut engine, mut rx) = create_engine();
            let settings = TimerSettings::default()
                .with_work_minutes(40)
                .with_sessions_before_long_break(3);

            engine.update_settings(settings.clone()).unwrap();

            assert_eq!(engine.state().time_remaining_seconds, 40 * 60);
            assert_eq!(engine.state().sessions_until_long_break, 3);
            let events = drain(&mut rx);
            assert_eq!(events[0], TimerEvent::SettingsChanged(settings));
        }

        #[test]
        fn test_update_settings_leaves_running_phase_alone() {
            let (mut engine, _rx) = create_engine();
            engine.start();

            engine
                .update_settings(TimerSettings::default().with_work_minutes(40))
                .unwrap();
            assert_eq!(engine.state().total_seconds, 25 * 60);
        }

        #[test]
        fn test_update_settings_rejects_out_of_range() {
            let (mut engine, _rx) = create_engine();
            let result = engine.update_settings(TimerSettings::default().with_work_minutes(0));
            assert!(result.is_err());
            assert_eq!(engine.settings().work_minutes, 25);
        }

        #[test]
        fn test_with_state_restores_running_timer_paused() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut state = TimerState::idle(&TimerSettings::default());
            state.phase = TimerPhase::Work;
            state.is_running = true;
            state.time_remaining_seconds = 600;

            let engine = TimerEngine::with_state(TimerSettings::default(), state, tx);
            assert!(!engine.state().is_running);
            assert_eq!(engine.state().time_remaining_seconds, 600);
        }
    }

    // ------------------------------------------------------------------------
    // Remote Application Tests
    // ------------------------------------------------------------------------

    mod remote_tests {
        use super::*;

        #[test]
        fn test_apply_remote_never_fires_completion_events() {
            let (mut source, _src_rx) = create_engine();
            source.start();
            source.skip();

            let (mut mirror, mut rx) = create_engine();
            mirror.apply_remote(source.state().clone(), Some(source.settings().clone()));

            assert_eq!(mirror.state(), source.state());
            assert_eq!(mirror.state().completed_work_sessions, 1);
            let events = drain(&mut rx);
            assert!(!has_completion_events(&events));
        }

        #[test]
        fn test_apply_remote_settings_replaced() {
            let (mut engine, mut rx) = create_engine();
            let settings = TimerSettings::default().with_break_minutes(10);
            let state = TimerState::idle(&settings);

            engine.apply_remote(state, Some(settings.clone()));
            assert_eq!(engine.settings(), &settings);
            assert!(drain(&mut rx).contains(&TimerEvent::SettingsChanged(settings)));
        }

        #[test]
        fn test_apply_remote_ignores_invalid_settings() {
            let (mut engine, _rx) = create_engine();
            let bad = TimerSettings::default().with_work_minutes(500);
            engine.apply_remote(TimerState::idle(&TimerSettings::default()), Some(bad));
            assert_eq!(engine.settings().work_minutes, 25);
        }

        #[test]
        fn test_apply_remote_normalizes_state() {
            let (mut engine, _rx) = create_engine();
            let mut state = TimerState::idle(&TimerSettings::default());
            state.is_running = true;

            engine.apply_remote(state, None);
            assert!(!engine.state().is_running);
        }

        #[test]
        fn test_apply_remote_reset_uses_local_settings() {
            let settings = TimerSettings::default().with_work_minutes(45);
            let (mut engine, _rx) = create_engine_with_settings(settings);
            engine.start();

            engine.apply_remote_reset();
            assert!(engine.state().is_idle());
            assert_eq!(engine.state().total_seconds, 45 * 60);
        }

        #[test]
        fn test_apply_remote_settings_rederives_idle() {
            let (mut engine, mut rx) = create_engine();
            engine.apply_remote_settings(TimerSettings::default().with_work_minutes(30));

            assert_eq!(engine.state().total_seconds, 30 * 60);
            assert!(!has_completion_events(&drain(&mut rx)));
        }
    }
}
