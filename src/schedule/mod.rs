//! Work-schedule arithmetic.
//!
//! Everything here is pure: callers pass the local wall-clock time in and
//! get the next deadline out. Night shifts (an end time earlier than the
//! start time) end on the calendar day after an active day.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::{ClaimDecision, ClaimExtra};

/// Longest wait armed directly; later deadlines are recomputed after midnight.
const MAX_ARMED_WAIT_HOURS: i64 = 24;

const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

// ============================================================================
// WorkSchedule
// ============================================================================

/// When the working day ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSchedule {
    /// Whether end-of-shift alerts fire at all
    pub enabled: bool,
    /// Working days, 0 = Sunday through 6 = Saturday
    pub active_days: Vec<u8>,
    /// Shift start, `HH:MM`
    pub start_time: String,
    /// Shift end, `HH:MM`
    pub end_time: String,
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            active_days: vec![1, 2, 3, 4, 5],
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
        }
    }
}

/// What the session loop should wait for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftWake {
    /// The shift ends at this time
    EndOfShift(NaiveDateTime),
    /// Nothing within a day; recompute at this time
    Recalculate(NaiveDateTime),
}

impl ShiftWake {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            ShiftWake::EndOfShift(t) | ShiftWake::Recalculate(t) => *t,
        }
    }
}

impl WorkSchedule {
    /// Checks that every active day is in 0..=6.
    pub fn validate(&self) -> Result<(), String> {
        match self.active_days.iter().find(|d| **d > 6) {
            Some(day) => Err(format!("day {day} is out of range (0 = Sunday .. 6 = Saturday)")),
            None => Ok(()),
        }
    }

    fn is_active(&self, date: NaiveDate) -> bool {
        let day = date.weekday().num_days_from_sunday() as u8;
        self.active_days.contains(&day)
    }

    fn is_night_shift(&self) -> bool {
        parse_time(&self.end_time) < parse_time(&self.start_time)
    }

    fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(time_of_day(&self.end_time))
    }

    /// The earliest end of shift strictly after `now`.
    pub fn next_end_time(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.active_days.is_empty() {
            return None;
        }
        let today = now.date();
        let night = self.is_night_shift();

        if night {
            // Yesterday's shift ends this morning.
            if let Some(yesterday) = today.pred_opt() {
                let end = self.end_on(today);
                if self.is_active(yesterday) && end > now {
                    return Some(end);
                }
            }
            // Today's shift ends tomorrow morning.
            if self.is_active(today) {
                return today.succ_opt().map(|tomorrow| self.end_on(tomorrow));
            }
        } else if self.is_active(today) {
            let end = self.end_on(today);
            if end > now {
                return Some(end);
            }
        }

        (1..=7)
            .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
            .find(|day| self.is_active(*day))
            .and_then(|day| if night { day.succ_opt() } else { Some(day) })
            .map(|day| self.end_on(day))
    }

    /// Decides what to wait for after `now`.
    ///
    /// Returns `None` when the schedule is off or has no working days.
    pub fn plan(&self, now: NaiveDateTime) -> Option<ShiftWake> {
        if !self.enabled {
            return None;
        }
        let next = self.next_end_time(now)?;

        if next - now > Duration::hours(MAX_ARMED_WAIT_HOURS) {
            let recalc = now
                .date()
                .succ_opt()?
                .and_hms_opt(0, 0, 1)?;
            return Some(ShiftWake::Recalculate(recalc));
        }
        Some(ShiftWake::EndOfShift(next))
    }
}

/// Today at `time`, or tomorrow if that moment has passed.
pub fn temporary_end_time(time: &str, now: NaiveDateTime) -> NaiveDateTime {
    let target = now.date().and_time(time_of_day(time));
    if target > now {
        return target;
    }
    target + Duration::days(1)
}

/// Parses `HH:MM` leniently: unparseable parts read as 0 and values are
/// clamped to a valid time of day.
pub fn parse_time(time: &str) -> (u32, u32) {
    let mut parts = time.split(':');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let hour = next();
    let minute = next();
    (hour.min(23), minute.min(59))
}

fn time_of_day(time: &str) -> NaiveTime {
    let (hour, minute) = parse_time(time);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Strict `HH:MM` check for user input.
pub fn validate_time(time: &str) -> Result<String, String> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| format!("'{time}' is not a time of day (HH:MM)"))
}

/// Parses a comma-separated day list: numbers 0-6 or `sun`..`sat`.
pub fn parse_days(list: &str) -> Result<Vec<u8>, String> {
    let mut days = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let lower = item.to_ascii_lowercase();
        let day = match DAY_NAMES.iter().position(|name| lower.starts_with(name)) {
            Some(index) => index as u8,
            None => match lower.parse::<u8>() {
                Ok(day) if day <= 6 => day,
                _ => return Err(format!("unknown day '{item}'")),
            },
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    days.sort_unstable();
    Ok(days)
}

/// Short names of the given days, e.g. `mon,tue`.
pub fn format_days(days: &[u8]) -> String {
    days.iter()
        .filter_map(|d| DAY_NAMES.get(usize::from(*d)))
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

/// Local wall-clock time.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

// ============================================================================
// ShiftDecision
// ============================================================================

/// The user's answer to the end-of-shift prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftDecision {
    /// End the session now
    End,
    /// Keep working until the given `HH:MM`
    Extend(String),
    /// Ignore this alert
    Dismiss,
}

impl ShiftDecision {
    /// Encodes the answer for the claim record.
    pub fn to_claim(&self) -> (ClaimDecision, Option<ClaimExtra>) {
        match self {
            ShiftDecision::End => (ClaimDecision::ProceedA, None),
            ShiftDecision::Extend(time) => {
                (ClaimDecision::ProceedB, Some(ClaimExtra::with_end_time(time.clone())))
            }
            ShiftDecision::Dismiss => (ClaimDecision::Dismiss, None),
        }
    }

    /// Decodes a claim resolution. An extension without a time is a dismissal.
    pub fn from_claim(decision: ClaimDecision, extra: Option<&ClaimExtra>) -> Self {
        match decision {
            ClaimDecision::ProceedA => ShiftDecision::End,
            ClaimDecision::ProceedB => match extra.and_then(|e| e.end_time.clone()) {
                Some(time) => ShiftDecision::Extend(time),
                None => ShiftDecision::Dismiss,
            },
            ClaimDecision::Dismiss => ShiftDecision::Dismiss,
        }
    }
}
