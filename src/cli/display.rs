//! Display utilities for the pomosync CLI.
//!
//! This module provides formatted output for:
//! - Error messages
//! - One-shot command results
//! - The interactive window (through [`ConsoleObserver`])

use std::path::Path;

use crate::cli::commands::SendAction;
use crate::schedule::{format_days, ShiftDecision};
use crate::session::{PersistedState, SessionObserver, SessionSnapshot};
use crate::types::{ClaimRecord, ModeSettings, SyncEnvelope, TimerPhase, TimerSettings, TimerState};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the banner of an interactive window.
    pub fn show_window_banner(origin_id: &str, dir: &Path) {
        println!("pomosync window {origin_id}");
        println!("  shared directory: {}", dir.display());
        println!("  type 'help' for commands");
    }

    /// Shows the result of a one-shot `send`.
    pub fn show_sent(action: SendAction, state: &TimerState) {
        println!("* sent {}", action.as_str());
        println!("  {}", Self::format_state(state));
    }

    /// Shows the shared slots and the saved state.
    pub fn show_shared_status(
        dir: &Path,
        envelope: Option<&SyncEnvelope>,
        claim: Option<&ClaimRecord>,
        saved: &PersistedState,
        now_ms: u64,
    ) {
        println!("pomosync status");
        println!("─────────────────────────────");
        println!("directory: {}", dir.display());

        match envelope {
            Some(env) => println!(
                "last broadcast: {} #{} from {} ({}s ago)",
                env.action.kind(),
                env.sequence,
                env.origin_id,
                env.age_ms(now_ms) / 1000
            ),
            None => println!("last broadcast: none"),
        }

        match claim {
            Some(record) => match record.decision {
                Some(decision) => println!(
                    "end-of-shift claim: resolved ({}) {}s ago",
                    decision.as_str(),
                    record.age_ms(now_ms) / 1000
                ),
                None => println!(
                    "end-of-shift claim: waiting for an answer ({}s)",
                    record.age_ms(now_ms) / 1000
                ),
            },
            None => println!("end-of-shift claim: none"),
        }

        match &saved.state {
            Some(state) => println!("saved timer: {}", Self::format_state(state)),
            None => println!("saved timer: none"),
        }
        println!("settings: {}", Self::format_settings(&saved.settings));
        println!(
            "focus mode: {}",
            Self::format_mode(saved.mode_enabled, &saved.mode_settings)
        );
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// One-line summary of a timer state.
    pub fn format_state(state: &TimerState) -> String {
        if state.phase == TimerPhase::Idle {
            return format!("Idle ({} work sessions done)", state.completed_work_sessions);
        }
        let (minutes, seconds) = Self::format_time(state.time_remaining_seconds);
        format!(
            "{} {}:{:02} {} ({:.0}%, {} until long break)",
            state.phase.label(),
            minutes,
            seconds,
            if state.is_running { "running" } else { "paused" },
            state.progress_percent(),
            state.sessions_until_long_break
        )
    }

    pub fn format_settings(settings: &TimerSettings) -> String {
        format!(
            "work {}m, break {}m, long break {}m every {}, auto-start {}, sound {}, notify {}, bar {}",
            settings.work_minutes,
            settings.break_minutes,
            settings.long_break_minutes,
            settings.sessions_before_long_break,
            on_off(settings.auto_start),
            on_off(settings.sound_enabled),
            on_off(settings.notifications_enabled),
            settings.progress_bar_position.as_str()
        )
    }

    pub fn format_mode(enabled: bool, settings: &ModeSettings) -> String {
        let visible: Vec<&str> = settings.visible().iter().map(|id| id.as_str()).collect();
        let visible = if visible.is_empty() {
            "nothing".to_string()
        } else {
            visible.join(", ")
        };
        format!("{} (visible: {visible})", on_off(enabled))
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

// ============================================================================
// ConsoleObserver
// ============================================================================

/// Prints session notifications to stdout.
///
/// Countdown ticks are shown once a minute; the terminal bell stands in for
/// the completion sound.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn new() -> Self {
        Self
    }
}

impl SessionObserver for ConsoleObserver {
    fn state_changed(&mut self, state: &TimerState) {
        println!("{}", Display::format_state(state));
    }

    fn tick(&mut self, state: &TimerState) {
        if state.time_remaining_seconds % 60 == 0 {
            println!("{}", Display::format_state(state));
        }
    }

    fn settings_changed(&mut self, settings: &TimerSettings) {
        println!("settings: {}", Display::format_settings(settings));
    }

    fn mode_changed(&mut self, enabled: bool, settings: &ModeSettings) {
        println!("focus mode: {}", Display::format_mode(enabled, settings));
    }

    fn phase_completed(&mut self, completed: TimerPhase, next: TimerPhase, settings: &TimerSettings) {
        if settings.sound_enabled {
            print!("\x07");
        }
        if settings.notifications_enabled {
            println!("* {} complete, next: {}", completed.label(), next.label());
        }
    }

    fn work_session_completed(&mut self, minutes: u32) {
        println!("  recorded a {minutes} minute work session");
    }

    fn shift_prompt(&mut self) {
        println!("* Your shift is over. Answer with 'end', 'extend HH:MM' or 'dismiss'.");
    }

    fn shift_resolved(&mut self, decision: Option<&ShiftDecision>, owned: bool) {
        let who = if owned { "you" } else { "another window" };
        match decision {
            Some(ShiftDecision::End) => println!("end of shift: session ended by {who}"),
            Some(ShiftDecision::Extend(time)) => println!("end of shift: {who} extended to {time}"),
            Some(ShiftDecision::Dismiss) => println!("end of shift: dismissed by {who}"),
            None => println!("end of shift: nobody answered"),
        }
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn status(&mut self, snapshot: &SessionSnapshot) {
        println!("window {}", snapshot.origin_id);
        println!("  timer: {}", Display::format_state(&snapshot.state));
        println!("  settings: {}", Display::format_settings(&snapshot.settings));
        println!(
            "  focus mode: {}",
            Display::format_mode(snapshot.mode_enabled, &snapshot.mode_settings)
        );
        if let Some(preset) = &snapshot.active_preset {
            println!("  preset: {preset}");
        }
        println!(
            "  schedule: {} {}-{} on {}",
            on_off(snapshot.schedule.enabled),
            snapshot.schedule.start_time,
            snapshot.schedule.end_time,
            format_days(&snapshot.schedule.active_days)
        );
        if let Some(end) = snapshot.next_shift_end {
            println!("  next end of shift: {}", end.format("%a %H:%M"));
        }
        if snapshot.prompt_pending {
            println!("  waiting for your end-of-shift answer");
        } else if snapshot.awaiting_claim {
            println!("  waiting for another window's end-of-shift answer");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
