//! Commands a participant accepts from its user.
//!
//! Commands are parsed from one line of text (`set work 50`,
//! `show minimap on`, `extend 18:30`).

use std::str::FromStr;

use crate::schedule::{parse_days, validate_time};
use crate::types::{ProgressBarPosition, ToggleId};

/// Help text listing every command.
pub const COMMAND_HELP: &str = "\
commands:
  start | pause | toggle | skip | reset | status
  set <work|break|long|sessions> <n>
  set <auto|sound|notify> <on|off>
  set bar <top|bottom|hidden>
  mode <on|off|toggle>
  show <toggle> <on|off>
  preset <id> | presets | save-preset <name> | delete-preset <id>
  schedule <on|off> | schedule days <d,d,..> | schedule hours <HH:MM> <HH:MM>
  end | extend <HH:MM> | dismiss
  help | quit";

/// A single timer-settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    WorkMinutes(u32),
    BreakMinutes(u32),
    LongBreakMinutes(u32),
    SessionsBeforeLongBreak(u32),
    AutoStart(bool),
    Sound(bool),
    Notifications(bool),
    ProgressBar(ProgressBarPosition),
}

/// Focus mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    On,
    Off,
    Toggle,
}

/// A work-schedule change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleChange {
    Enabled(bool),
    Days(Vec<u8>),
    Hours { start: String, end: String },
}

/// A user command for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCommand {
    Start,
    Pause,
    Toggle,
    Skip,
    Reset,
    Status,
    Set(SettingChange),
    Mode(ModeSwitch),
    Show { toggle: ToggleId, visible: bool },
    Preset(String),
    Presets,
    SavePreset(String),
    DeletePreset(String),
    Schedule(ScheduleChange),
    /// Answer the end-of-shift prompt: end now
    End,
    /// Answer the end-of-shift prompt: keep working until `HH:MM`
    Extend(String),
    /// Answer the end-of-shift prompt: ignore it
    Dismiss,
    Help,
    Quit,
}

impl WindowCommand {
    /// True for commands that change nothing.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            WindowCommand::Status | WindowCommand::Presets | WindowCommand::Help
        )
    }
}

impl FromStr for WindowCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        let command = match (head.to_ascii_lowercase().as_str(), args) {
            ("start", []) => WindowCommand::Start,
            ("pause", []) => WindowCommand::Pause,
            ("toggle", []) => WindowCommand::Toggle,
            ("skip", []) => WindowCommand::Skip,
            ("reset", []) => WindowCommand::Reset,
            ("status", []) => WindowCommand::Status,
            ("set", [key, value]) => WindowCommand::Set(parse_setting(key, value)?),
            ("mode", [switch]) => WindowCommand::Mode(match *switch {
                "on" => ModeSwitch::On,
                "off" => ModeSwitch::Off,
                "toggle" => ModeSwitch::Toggle,
                other => return Err(format!("expected on, off or toggle, got '{other}'")),
            }),
            ("show", [toggle, value]) => WindowCommand::Show {
                toggle: toggle.parse()?,
                visible: parse_switch(value)?,
            },
            ("preset", [id]) => WindowCommand::Preset(id.to_string()),
            ("presets", []) => WindowCommand::Presets,
            ("save-preset", name) if !name.is_empty() => WindowCommand::SavePreset(name.join(" ")),
            ("delete-preset", [id]) => WindowCommand::DeletePreset(id.to_string()),
            ("schedule", [value]) => {
                WindowCommand::Schedule(ScheduleChange::Enabled(parse_switch(value)?))
            }
            ("schedule", ["days", list]) => {
                WindowCommand::Schedule(ScheduleChange::Days(parse_days(list)?))
            }
            ("schedule", ["hours", start, end]) => WindowCommand::Schedule(ScheduleChange::Hours {
                start: validate_time(start)?,
                end: validate_time(end)?,
            }),
            ("end", []) => WindowCommand::End,
            ("extend", [time]) => WindowCommand::Extend(validate_time(time)?),
            ("dismiss", []) => WindowCommand::Dismiss,
            ("help" | "?", []) => WindowCommand::Help,
            ("quit" | "exit", []) => WindowCommand::Quit,
            _ => return Err(format!("unknown command '{}' (try 'help')", line.trim())),
        };
        Ok(command)
    }
}

fn parse_setting(key: &str, value: &str) -> Result<SettingChange, String> {
    let change = match key {
        "work" => SettingChange::WorkMinutes(parse_count(value)?),
        "break" => SettingChange::BreakMinutes(parse_count(value)?),
        "long" => SettingChange::LongBreakMinutes(parse_count(value)?),
        "sessions" => SettingChange::SessionsBeforeLongBreak(parse_count(value)?),
        "auto" => SettingChange::AutoStart(parse_switch(value)?),
        "sound" => SettingChange::Sound(parse_switch(value)?),
        "notify" => SettingChange::Notifications(parse_switch(value)?),
        "bar" => SettingChange::ProgressBar(value.parse()?),
        other => return Err(format!("unknown setting '{other}'")),
    };
    Ok(change)
}

fn parse_count(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("expected a number, got '{value}'"))
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}
