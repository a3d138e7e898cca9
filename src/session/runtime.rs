//! One participant: engine, focus mode and coordination in a single task.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use super::command::{ModeSwitch, ScheduleChange, SettingChange, WindowCommand, COMMAND_HELP};
use super::observer::{SessionObserver, SessionSnapshot};
use super::store::{Preferences, SavedTimer, StateStore};
use crate::mode::{FocusMode, ModeApplier, ModeEvent, PresetLibrary};
use crate::schedule::{format_days, local_now, temporary_end_time, ShiftDecision, ShiftWake, WorkSchedule};
use crate::sync::{
    spawn_slot_watcher, BroadcastChannel, ClaimOutcome, ClaimResolution, Clock, LeaderClaim,
    SlotWatcher, SyncConfig, WatchSignal, BROADCAST_FILE, CLAIM_FILE,
};
use crate::timer::{TimerEngine, TimerEvent};
use crate::types::{SyncAction, TimerSettings, TimerState};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One participant in a shared session.
///
/// All state lives on the task that calls [`Session::run`]; the broadcast
/// handler shares the engine and focus mode through `Rc<RefCell<_>>`.
pub struct Session {
    dir: PathBuf,
    config: SyncConfig,
    clock: Arc<dyn Clock>,
    engine: Rc<RefCell<TimerEngine>>,
    mode: Rc<RefCell<FocusMode>>,
    presets: PresetLibrary,
    schedule: WorkSchedule,
    channel: Rc<BroadcastChannel>,
    claim: LeaderClaim,
    store: StateStore,
    observer: Box<dyn SessionObserver>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    mode_rx: mpsc::UnboundedReceiver<ModeEvent>,
    claim_rx: mpsc::UnboundedReceiver<ClaimResolution>,
    shift_wake: Option<ShiftWake>,
    prompt_pending: bool,
    watcher: Option<SlotWatcher>,
    disposed: bool,
}

impl Session {
    /// Builds a participant over the shared directory `dir`.
    pub fn new(
        config: SyncConfig,
        dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        applier: Box<dyn ModeApplier>,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self> {
        config.validate().context("Invalid sync configuration")?;
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(path = %dir.display(), error = %e, "cannot create shared directory");
        }

        let store = StateStore::new(&dir);
        let persisted = store.load();

        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (mode_tx, mode_rx) = mpsc::unbounded_channel();
        let (claim_tx, claim_rx) = mpsc::unbounded_channel();

        let state = persisted
            .state
            .unwrap_or_else(|| TimerState::idle(&persisted.settings));
        let engine = Rc::new(RefCell::new(TimerEngine::with_state(
            persisted.settings,
            state,
            timer_tx,
        )));
        let mode = Rc::new(RefCell::new(FocusMode::new(
            persisted.mode_enabled,
            persisted.mode_settings,
            applier,
            mode_tx,
        )));

        let channel = Rc::new(BroadcastChannel::new(&dir, &config, Arc::clone(&clock)));
        {
            let engine = Rc::clone(&engine);
            let mode = Rc::clone(&mode);
            channel.subscribe(move |action| apply_remote_action(&engine, &mode, action));
        }
        let claim = LeaderClaim::new(&dir, &config, Arc::clone(&clock), claim_tx);

        tracing::info!(origin = channel.origin_id(), path = %dir.display(), "participant joined");

        Ok(Self {
            dir,
            config,
            clock,
            engine,
            mode,
            presets: PresetLibrary::new(persisted.custom_presets, persisted.active_preset_id),
            schedule: persisted.schedule,
            channel,
            claim,
            store,
            observer,
            timer_rx,
            mode_rx,
            claim_rx,
            shift_wake: None,
            prompt_pending: false,
            watcher: None,
            disposed: false,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn origin_id(&self) -> &str {
        self.channel.origin_id()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> TimerState {
        self.engine.borrow().state().clone()
    }

    pub fn settings(&self) -> TimerSettings {
        self.engine.borrow().settings().clone()
    }

    pub fn mode_enabled(&self) -> bool {
        self.mode.borrow().is_enabled()
    }

    pub fn schedule(&self) -> &WorkSchedule {
        &self.schedule
    }

    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    /// The end-of-shift wake-up currently armed.
    pub fn shift_wake(&self) -> Option<ShiftWake> {
        self.shift_wake
    }

    /// True while this participant owns an unanswered end-of-shift prompt.
    pub fn is_prompt_pending(&self) -> bool {
        self.prompt_pending
    }

    pub fn is_awaiting_claim(&self) -> bool {
        self.claim.is_awaiting()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mode = self.mode.borrow();
        SessionSnapshot {
            origin_id: self.origin_id().to_string(),
            state: self.state(),
            settings: self.settings(),
            mode_enabled: mode.is_enabled(),
            mode_settings: *mode.settings(),
            active_preset: self.presets.active_id().map(str::to_string),
            presets: self.presets.all(),
            schedule: self.schedule.clone(),
            next_shift_end: match self.shift_wake {
                Some(ShiftWake::EndOfShift(t)) => Some(t),
                _ => None,
            },
            prompt_pending: self.prompt_pending,
            awaiting_claim: self.claim.is_awaiting(),
        }
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Runs until `quit` or until `commands` closes, then disposes.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<WindowCommand>) -> Result<()> {
        let (watch_tx, mut watch_rx) = mpsc::unbounded_channel();
        let mut watching = false;
        if self.config.watch_enabled {
            match spawn_slot_watcher(&self.dir, &[BROADCAST_FILE, CLAIM_FILE], watch_tx) {
                Ok(watcher) => {
                    self.watcher = Some(watcher);
                    watching = true;
                }
                Err(e) => tracing::info!(
                    error = %e,
                    hint = e.suggestion(),
                    "change notifier unavailable, polling only"
                ),
            }
        } else {
            drop(watch_tx);
        }

        self.initial_sync();
        self.arm_next_shift();

        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let poll_every = self.config.poll_interval();
        let mut poller = interval_at(Instant::now() + poll_every, poll_every);
        poller.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let has_wake = self.shift_wake.is_some();
            let wake_at = self
                .shift_wake
                .map(|wake| instant_for(wake.at(), local_now()))
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = poller.tick() => self.poll_remote(),
                signal = watch_rx.recv(), if watching => match signal {
                    Some(WatchSignal::Changed) => self.poll_remote(),
                    Some(WatchSignal::Unavailable { reason }) => {
                        tracing::warn!(%reason, "change notifier stopped, polling only");
                        self.watcher = None;
                        watching = false;
                    }
                    None => watching = false,
                },
                _ = sleep_until(wake_at), if has_wake => self.on_shift_wake(),
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        self.dispose();
        Ok(())
    }

    /// Adopts whatever is currently in the broadcast slot.
    pub fn initial_sync(&mut self) {
        self.channel.initial_sync();
        self.drain_events();
    }

    /// One countdown step.
    pub fn tick(&mut self) {
        self.engine.borrow_mut().tick();
        self.drain_events();
    }

    /// One poll step: broadcast slot, then claim slot.
    pub fn poll_remote(&mut self) {
        if self.disposed {
            return;
        }
        self.channel.check_for_update();
        self.drain_events();
        self.poll_claim();
    }

    /// Releases everything this participant holds. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.claim.cancel();
        self.channel.dispose();
        self.watcher = None;
        self.save_timer();
        self.save_mode();
        tracing::info!(origin = self.channel.origin_id(), "participant left");
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Executes one user command. Returns false when the session should stop.
    pub fn handle_command(&mut self, command: WindowCommand) -> bool {
        tracing::debug!(?command, "command");
        let mutating = !command.is_read_only();
        match command {
            WindowCommand::Start => {
                self.engine.borrow_mut().start();
                let action = SyncAction::TimerStart {
                    state: self.state(),
                    settings: Some(self.settings()),
                };
                self.publish(action);
            }
            WindowCommand::Pause => {
                self.engine.borrow_mut().pause();
                let action = SyncAction::TimerPause { state: self.state() };
                self.publish(action);
            }
            WindowCommand::Toggle => {
                self.engine.borrow_mut().toggle();
                let state = self.state();
                let action = if state.is_running {
                    SyncAction::TimerStart {
                        state,
                        settings: Some(self.settings()),
                    }
                } else {
                    SyncAction::TimerPause { state }
                };
                self.publish(action);
            }
            WindowCommand::Skip => {
                self.engine.borrow_mut().skip();
                let action = SyncAction::TimerSkip {
                    state: self.state(),
                    settings: Some(self.settings()),
                };
                self.publish(action);
            }
            WindowCommand::Reset => {
                self.engine.borrow_mut().reset();
                self.publish(SyncAction::TimerReset);
            }
            WindowCommand::Status => {
                let snapshot = self.snapshot();
                self.observer.status(&snapshot);
            }
            WindowCommand::Set(change) => self.change_setting(change),
            WindowCommand::Mode(switch) => self.switch_mode(switch),
            WindowCommand::Show { toggle, visible } => {
                self.mode.borrow_mut().update_toggle(toggle, visible);
                let action = SyncAction::ModeToggleChanged {
                    toggle_id: toggle,
                    value: visible,
                    settings: *self.mode.borrow().settings(),
                };
                self.publish(action);
            }
            WindowCommand::Preset(id) => self.apply_preset(&id),
            WindowCommand::Presets => {
                self.reload_presets();
                let active = self.presets.active_id().map(str::to_string);
                for preset in self.presets.all() {
                    let marker = if active.as_deref() == Some(preset.id.as_str()) { "*" } else { " " };
                    let line = format!("{marker} {:<20} {}", preset.id, preset.name);
                    self.observer.message(&line);
                }
            }
            WindowCommand::SavePreset(name) => {
                self.reload_presets();
                let settings = *self.mode.borrow().settings();
                let preset = self.presets.save_custom(&name, settings, self.clock.now_ms());
                self.observer
                    .message(&format!("saved preset '{}' as {}", preset.name, preset.id));
                self.save_presets();
            }
            WindowCommand::DeletePreset(id) => {
                self.reload_presets();
                if self.presets.delete_custom(&id) {
                    self.observer.message(&format!("deleted preset {id}"));
                    self.save_presets();
                } else {
                    self.observer.message(&format!("no custom preset '{id}'"));
                }
            }
            WindowCommand::Schedule(change) => self.change_schedule(change),
            WindowCommand::End => self.answer_shift(ShiftDecision::End),
            WindowCommand::Extend(time) => self.answer_shift(ShiftDecision::Extend(time)),
            WindowCommand::Dismiss => self.answer_shift(ShiftDecision::Dismiss),
            WindowCommand::Help => self.observer.message(COMMAND_HELP),
            WindowCommand::Quit => return false,
        }
        if mutating {
            self.drain_events();
        }
        true
    }

    fn change_setting(&mut self, change: SettingChange) {
        let mut settings = self.settings();
        match change {
            SettingChange::WorkMinutes(n) => settings.work_minutes = n,
            SettingChange::BreakMinutes(n) => settings.break_minutes = n,
            SettingChange::LongBreakMinutes(n) => settings.long_break_minutes = n,
            SettingChange::SessionsBeforeLongBreak(n) => settings.sessions_before_long_break = n,
            SettingChange::AutoStart(on) => settings.auto_start = on,
            SettingChange::Sound(on) => settings.sound_enabled = on,
            SettingChange::Notifications(on) => settings.notifications_enabled = on,
            SettingChange::ProgressBar(position) => settings.progress_bar_position = position,
        }

        let result = self.engine.borrow_mut().update_settings(settings.clone());
        match result {
            Ok(()) => self.publish(SyncAction::TimerSettingsChanged { settings }),
            Err(reason) => self.observer.message(&reason),
        }
    }

    fn switch_mode(&mut self, switch: ModeSwitch) {
        match switch {
            ModeSwitch::On => {
                self.mode.borrow_mut().enable();
            }
            ModeSwitch::Off => {
                self.mode.borrow_mut().disable();
            }
            ModeSwitch::Toggle => self.mode.borrow_mut().toggle(),
        }

        let (enabled, settings) = {
            let mode = self.mode.borrow();
            (mode.is_enabled(), *mode.settings())
        };
        let action = if enabled {
            SyncAction::ModeEnabled { settings }
        } else {
            SyncAction::ModeDisabled { settings }
        };
        self.publish(action);
    }

    fn apply_preset(&mut self, id: &str) {
        self.reload_presets();
        let Some(preset) = self.presets.get(id) else {
            self.observer.message(&format!("no preset '{id}' (try 'presets')"));
            return;
        };
        self.presets.set_active(Some(preset.id.clone()));
        {
            let mut mode = self.mode.borrow_mut();
            mode.apply_settings(preset.settings);
            mode.enable();
        }
        self.publish(SyncAction::PresetApplied {
            settings: preset.settings,
        });
        self.save_presets();
    }

    fn change_schedule(&mut self, change: ScheduleChange) {
        self.schedule = self.store.load_preferences().schedule;
        match change {
            ScheduleChange::Enabled(on) => self.schedule.enabled = on,
            ScheduleChange::Days(days) => self.schedule.active_days = days,
            ScheduleChange::Hours { start, end } => {
                self.schedule.start_time = start;
                self.schedule.end_time = end;
            }
        }

        // An unanswered end of shift re-arms once it is settled.
        let summary = if self.prompt_pending || self.claim.is_awaiting() {
            "applies after the current end of shift".to_string()
        } else {
            self.arm_next_shift();
            match self.shift_wake {
                Some(ShiftWake::EndOfShift(t)) => {
                    format!("next end of shift {}", t.format("%a %H:%M"))
                }
                Some(ShiftWake::Recalculate(_)) => "no end of shift within a day".to_string(),
                None => "end-of-shift alerts off".to_string(),
            }
        };
        let line = format!(
            "schedule {} {}-{} on {}: {summary}",
            if self.schedule.enabled { "on" } else { "off" },
            self.schedule.start_time,
            self.schedule.end_time,
            format_days(&self.schedule.active_days),
        );
        self.observer.message(&line);
        self.save_schedule();
    }

    fn publish(&mut self, action: SyncAction) {
        let kind = action.kind();
        let outcome = self.channel.publish(action);
        if !outcome.is_sent() {
            tracing::debug!(kind, ?outcome, "broadcast not sent, other participants stay behind");
        }
    }

    // ------------------------------------------------------------------------
    // End of shift
    // ------------------------------------------------------------------------

    /// Arms the next scheduled wake-up from the local wall clock.
    pub fn arm_next_shift(&mut self) {
        self.shift_wake = self.schedule.plan(local_now());
        if let Some(wake) = self.shift_wake {
            tracing::debug!(at = %wake.at(), "shift wake armed");
        }
    }

    fn on_shift_wake(&mut self) {
        match self.shift_wake.take() {
            Some(ShiftWake::EndOfShift(_)) => self.trigger_end_of_shift(),
            Some(ShiftWake::Recalculate(_)) => self.arm_next_shift(),
            None => {}
        }
    }

    /// Contends for the end-of-shift prompt.
    pub fn trigger_end_of_shift(&mut self) {
        self.shift_wake = None;
        match self.claim.try_claim() {
            Ok(ClaimOutcome::Owner) => {
                self.prompt_pending = true;
                self.observer.shift_prompt();
            }
            Ok(ClaimOutcome::Follower) => {
                self.claim.begin_await();
                self.poll_claim();
            }
            Err(e) => {
                tracing::warn!(error = %e, "claim failed, waiting as follower");
                self.claim.begin_await();
                self.poll_claim();
            }
        }
    }

    fn answer_shift(&mut self, decision: ShiftDecision) {
        if !self.prompt_pending {
            match decision {
                ShiftDecision::End => self.end_session_locally(),
                ShiftDecision::Extend(time) => {
                    let until = temporary_end_time(&time, local_now());
                    self.shift_wake = Some(ShiftWake::EndOfShift(until));
                    self.observer
                        .message(&format!("end of shift moved to {}", until.format("%a %H:%M")));
                }
                ShiftDecision::Dismiss => self.observer.message("no end-of-shift prompt to dismiss"),
            }
            return;
        }

        self.prompt_pending = false;
        let (claim_decision, extra) = decision.to_claim();
        if let Err(e) = self.claim.resolve(claim_decision, extra) {
            tracing::warn!(error = %e, "cannot record decision, other participants re-arm alone");
        }
        self.drain_resolutions();
    }

    fn poll_claim(&mut self) {
        if self.claim.is_awaiting() {
            self.claim.poll_resolution();
        }
        self.drain_resolutions();
    }

    fn drain_resolutions(&mut self) {
        while let Ok(resolution) = self.claim_rx.try_recv() {
            self.handle_resolution(resolution);
        }
    }

    fn handle_resolution(&mut self, resolution: ClaimResolution) {
        match resolution {
            ClaimResolution::Decided {
                decision,
                extra,
                owned,
            } => {
                let decision = ShiftDecision::from_claim(decision, extra.as_ref());
                tracing::info!(?decision, owned, "end of shift settled");
                self.observer.shift_resolved(Some(&decision), owned);
                match decision {
                    ShiftDecision::End => {
                        self.end_session_locally();
                        self.arm_next_shift();
                    }
                    ShiftDecision::Extend(time) => {
                        let until = temporary_end_time(&time, local_now());
                        self.shift_wake = Some(ShiftWake::EndOfShift(until));
                    }
                    ShiftDecision::Dismiss => self.arm_next_shift(),
                }
            }
            ClaimResolution::Abandoned => {
                self.observer.shift_resolved(None, false);
                self.arm_next_shift();
            }
        }
        self.drain_events();
    }

    /// Resets the timer and switches focus mode off without broadcasting.
    fn end_session_locally(&mut self) {
        self.engine.borrow_mut().reset();
        self.mode.borrow_mut().disable();
        self.drain_events();
    }

    // ------------------------------------------------------------------------
    // Events and persistence
    // ------------------------------------------------------------------------

    fn drain_events(&mut self) {
        let mut timer_dirty = false;
        let mut mode_dirty = false;

        while let Ok(event) = self.timer_rx.try_recv() {
            timer_dirty = true;
            match event {
                TimerEvent::StateChanged(state) => self.observer.state_changed(&state),
                TimerEvent::Tick { .. } => {
                    let state = self.state();
                    self.observer.tick(&state);
                }
                TimerEvent::SettingsChanged(settings) => self.observer.settings_changed(&settings),
                TimerEvent::PhaseCompleted { completed, next } => {
                    let settings = self.settings();
                    self.observer.phase_completed(completed, next, &settings);
                }
                TimerEvent::WorkSessionCompleted { minutes } => {
                    self.observer.work_session_completed(minutes)
                }
            }
        }

        while let Ok(event) = self.mode_rx.try_recv() {
            mode_dirty = true;
            let (enabled, settings) = {
                let mode = self.mode.borrow();
                (mode.is_enabled(), *mode.settings())
            };
            match event {
                ModeEvent::StateChanged { enabled } => self.observer.mode_changed(enabled, &settings),
                ModeEvent::SettingsChanged(settings) => self.observer.mode_changed(enabled, &settings),
            }
        }

        if timer_dirty {
            self.save_timer();
        }
        if mode_dirty {
            self.save_mode();
        }
    }

    fn save_timer(&self) {
        let timer = {
            let engine = self.engine.borrow();
            SavedTimer {
                settings: engine.settings().clone(),
                state: Some(engine.state().clone()),
            }
        };
        if let Err(e) = self.store.save_timer(&timer) {
            tracing::warn!(error = %e, hint = e.suggestion(), "cannot save timer");
        }
    }

    fn save_mode(&self) {
        let (enabled, settings) = {
            let mode = self.mode.borrow();
            (mode.is_enabled(), *mode.settings())
        };
        self.save_preferences("focus mode", |p| {
            p.mode_enabled = enabled;
            p.mode_settings = settings;
        });
    }

    fn save_presets(&self) {
        let custom = self.presets.custom().to_vec();
        let active = self.presets.active_id().map(str::to_string);
        self.save_preferences("presets", move |p| {
            p.custom_presets = custom;
            p.active_preset_id = active;
        });
    }

    fn save_schedule(&self) {
        let schedule = self.schedule.clone();
        self.save_preferences("schedule", move |p| p.schedule = schedule);
    }

    fn save_preferences(&self, what: &str, update: impl FnOnce(&mut Preferences)) {
        if let Err(e) = self.store.update_preferences(update) {
            tracing::warn!(error = %e, hint = e.suggestion(), what, "cannot save preferences");
        }
    }

    /// Picks up presets saved by other participants.
    fn reload_presets(&mut self) {
        let saved = self.store.load_preferences();
        self.presets = PresetLibrary::new(saved.custom_presets, saved.active_preset_id);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("origin", &self.channel.origin_id())
            .field("dir", &self.dir)
            .field("shift_wake", &self.shift_wake)
            .field("prompt_pending", &self.prompt_pending)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Routes a remote action to the engine or focus mode.
fn apply_remote_action(
    engine: &RefCell<TimerEngine>,
    mode: &RefCell<FocusMode>,
    action: &SyncAction,
) {
    match action.clone() {
        SyncAction::TimerStart { state, settings } | SyncAction::TimerSkip { state, settings } => {
            engine.borrow_mut().apply_remote(state, settings);
        }
        SyncAction::TimerPause { state } => engine.borrow_mut().apply_remote(state, None),
        SyncAction::TimerReset => engine.borrow_mut().apply_remote_reset(),
        SyncAction::TimerSettingsChanged { settings } => {
            engine.borrow_mut().apply_remote_settings(settings);
        }
        SyncAction::ModeEnabled { settings } | SyncAction::PresetApplied { settings } => {
            mode.borrow_mut().sync_state(true, settings);
        }
        SyncAction::ModeDisabled { settings } => mode.borrow_mut().sync_state(false, settings),
        SyncAction::ModeToggleChanged { settings, .. } => {
            let enabled = mode.borrow().is_enabled();
            mode.borrow_mut().sync_state(enabled, settings);
        }
    }
}

/// Converts a local wall-clock target into a runtime instant.
fn instant_for(target: NaiveDateTime, now: NaiveDateTime) -> Instant {
    let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
    Instant::now() + wait
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ApplierCall, MockModeApplier};
    use crate::session::{ObservedEvent, RecordingObserver};
    use crate::sync::MockClock;
    use crate::types::{TimerPhase, ToggleId};

    const NOW_MS: u64 = 1_800_000_000_000;

    fn create_session(dir: &Path, clock: &MockClock) -> (Session, RecordingObserver, MockModeApplier) {
        let observer = RecordingObserver::new();
        let applier = MockModeApplier::new();
        let session = Session::new(
            SyncConfig::default().with_watch_enabled(false),
            dir,
            Arc::new(clock.clone()),
            Box::new(applier.clone()),
            Box::new(observer.clone()),
        )
        .unwrap();
        (session, observer, applier)
    }

    mod command_tests {
        use super::*;

        #[test]
        fn test_start_runs_timer_and_persists() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, observer, _) = create_session(dir.path(), &clock);

            assert!(session.handle_command(WindowCommand::Start));

            let state = session.state();
            assert_eq!(state.phase, TimerPhase::Work);
            assert!(state.is_running);
            assert!(observer.count(|e| matches!(e, ObservedEvent::StateChanged(_))) >= 1);

            let saved = StateStore::new(dir.path()).load();
            assert_eq!(saved.state.unwrap().phase, TimerPhase::Work);
        }

        #[test]
        fn test_quit_stops() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);
            assert!(!session.handle_command(WindowCommand::Quit));
        }

        #[test]
        fn test_invalid_setting_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, observer, _) = create_session(dir.path(), &clock);

            session.handle_command(WindowCommand::Set(SettingChange::WorkMinutes(0)));

            assert_eq!(session.settings().work_minutes, 25);
            assert_eq!(observer.messages().len(), 1);
        }

        #[test]
        fn test_preset_enables_mode_with_its_settings() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, applier) = create_session(dir.path(), &clock);

            session.handle_command(WindowCommand::Preset("writer".to_string()));

            assert!(session.mode_enabled());
            assert_eq!(session.presets().active_id(), Some("writer"));
            assert!(session.snapshot().mode_settings.line_highlight);
            assert!(applier
                .calls()
                .iter()
                .any(|c| matches!(c, ApplierCall::Enable(s) if s.line_highlight)));
        }

        #[test]
        fn test_save_and_delete_custom_preset() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            session.handle_command(WindowCommand::Show {
                toggle: ToggleId::Tabs,
                visible: true,
            });
            session.handle_command(WindowCommand::SavePreset("Tabs only".to_string()));

            let id = format!("custom-{NOW_MS}");
            let saved = session.presets().get(&id).unwrap();
            assert!(saved.settings.tabs);
            assert_eq!(StateStore::new(dir.path()).load().custom_presets.len(), 1);

            session.handle_command(WindowCommand::DeletePreset(id.clone()));
            assert!(session.presets().get(&id).is_none());
        }

        #[test]
        fn test_status_reports_snapshot() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, observer, _) = create_session(dir.path(), &clock);

            session.handle_command(WindowCommand::Status);

            let events = observer.events();
            let Some(ObservedEvent::Status(snapshot)) = events.last() else {
                panic!("expected a status snapshot");
            };
            assert_eq!(snapshot.origin_id, session.origin_id());
            assert_eq!(snapshot.presets.len(), 3);
        }
    }

    mod shift_tests {
        use super::*;

        #[test]
        fn test_owner_end_resets_and_disables_mode() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, observer, _) = create_session(dir.path(), &clock);
            session.handle_command(WindowCommand::Start);
            session.handle_command(WindowCommand::Mode(ModeSwitch::On));

            session.trigger_end_of_shift();
            assert!(session.is_prompt_pending());
            assert_eq!(observer.count(|e| matches!(e, ObservedEvent::ShiftPrompt)), 1);

            session.handle_command(WindowCommand::End);

            assert!(!session.is_prompt_pending());
            assert!(session.state().is_idle());
            assert!(!session.mode_enabled());
            assert!(observer.events().contains(&ObservedEvent::ShiftResolved {
                decision: Some(ShiftDecision::End),
                owned: true,
            }));
        }

        #[test]
        fn test_extend_arms_temporary_end() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            session.trigger_end_of_shift();
            session.handle_command(WindowCommand::Extend("23:59".to_string()));

            match session.shift_wake() {
                Some(ShiftWake::EndOfShift(t)) => assert!(t > local_now()),
                other => panic!("expected an armed end of shift, got {other:?}"),
            }
        }

        #[test]
        fn test_follower_adopts_owner_decision() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut owner, _, _) = create_session(dir.path(), &clock);
            let (mut follower, follower_events, _) = create_session(dir.path(), &clock);

            owner.handle_command(WindowCommand::Start);
            follower.poll_remote();
            assert!(follower.state().is_running);

            owner.trigger_end_of_shift();
            follower.trigger_end_of_shift();
            assert!(owner.is_prompt_pending());
            assert!(!follower.is_prompt_pending());
            assert!(follower.is_awaiting_claim());

            owner.handle_command(WindowCommand::End);
            clock.advance(500);
            follower.poll_remote();

            assert!(!follower.is_awaiting_claim());
            assert!(follower.state().is_idle());
            assert!(follower_events.events().contains(&ObservedEvent::ShiftResolved {
                decision: Some(ShiftDecision::End),
                owned: false,
            }));
        }

        #[test]
        fn test_end_without_prompt_ends_locally() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);
            session.handle_command(WindowCommand::Start);

            session.handle_command(WindowCommand::End);

            assert!(session.state().is_idle());
        }

        #[test]
        fn test_schedule_off_disarms() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            session.handle_command(WindowCommand::Schedule(ScheduleChange::Enabled(true)));
            session.handle_command(WindowCommand::Schedule(ScheduleChange::Days(vec![0, 1, 2, 3, 4, 5, 6])));
            assert!(matches!(session.shift_wake(), Some(ShiftWake::EndOfShift(_))));

            session.handle_command(WindowCommand::Schedule(ScheduleChange::Enabled(false)));
            assert_eq!(session.shift_wake(), None);
            assert!(!StateStore::new(dir.path()).load().schedule.enabled);
        }

        #[test]
        fn test_schedule_change_waits_for_pending_prompt() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            session.trigger_end_of_shift();
            session.handle_command(WindowCommand::Schedule(ScheduleChange::Enabled(true)));
            session.handle_command(WindowCommand::Schedule(ScheduleChange::Days(vec![0, 1, 2, 3, 4, 5, 6])));

            assert!(session.is_prompt_pending());
            assert_eq!(session.shift_wake(), None);
            assert!(StateStore::new(dir.path()).load().schedule.enabled);

            session.handle_command(WindowCommand::Dismiss);
            assert!(!session.is_prompt_pending());
            assert!(matches!(session.shift_wake(), Some(ShiftWake::EndOfShift(_))));
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_dispose_is_idempotent() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            session.dispose();
            session.dispose();
            assert!(session.is_disposed());
        }

        #[test]
        fn test_running_timer_restored_paused() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            {
                let (mut session, _, _) = create_session(dir.path(), &clock);
                session.handle_command(WindowCommand::Start);
            }

            let (session, _, _) = create_session(dir.path(), &clock);
            let state = session.state();
            assert_eq!(state.phase, TimerPhase::Work);
            assert!(!state.is_running);
        }

        #[tokio::test]
        async fn test_run_ends_when_commands_close() {
            let dir = tempfile::tempdir().unwrap();
            let clock = MockClock::new(NOW_MS);
            let (mut session, _, _) = create_session(dir.path(), &clock);

            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(WindowCommand::Start).unwrap();
            drop(tx);

            session.run(rx).await.unwrap();

            assert!(session.is_disposed());
            assert!(session.state().is_running);
        }
    }
}
