//! pomosync library
//!
//! One Pomodoro session shared by several local processes (editor windows)
//! that only have a common directory to talk through. It includes:
//! - Timer engine for the work/break cycle
//! - Broadcast channel that replays each process's actions in the others
//! - Leader claim so one process alone answers the end-of-shift prompt
//! - Focus mode state, presets and the seam to the editor settings
//! - Work-schedule arithmetic
//! - The per-process session runtime and its CLI front end

pub mod cli;
pub mod mode;
pub mod schedule;
pub mod session;
pub mod sync;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ModeSettings, SyncAction, SyncEnvelope, TimerPhase, TimerSettings, TimerState, ToggleId,
};

pub use sync::{BroadcastChannel, LeaderClaim, SyncConfig, SyncError};

pub use session::{Session, SessionObserver, WindowCommand};

pub use timer::{TimerEngine, TimerEvent};
