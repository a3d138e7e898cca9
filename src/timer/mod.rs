//! Pomodoro timer state machine.
//!
//! The engine is pure in-memory logic. The session loop calls
//! [`TimerEngine::tick`] once a second and drains [`TimerEvent`]s after
//! every step.

mod engine;

pub use engine::{TimerEngine, TimerEvent};
