//! Per-process runtime.
//!
//! A [`Session`] is one participant (one editor window): it owns a timer
//! engine, a focus mode, a broadcast channel and a claim coordinator over a
//! shared directory, and drives them from a single task. Several sessions
//! over the same directory behave as one shared timer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pomosync::mode::LoggingModeApplier;
//! use pomosync::session::{NullObserver, Session, WindowCommand};
//! use pomosync::sync::{SyncConfig, SystemClock};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut session = Session::new(
//!     SyncConfig::default(),
//!     "/tmp/pomosync",
//!     Arc::new(SystemClock),
//!     Box::new(LoggingModeApplier),
//!     Box::new(NullObserver),
//! )?;
//!
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! tx.send(WindowCommand::Start)?;
//! drop(tx);
//! session.run(rx).await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod observer;
mod runtime;
mod store;

pub use command::{ModeSwitch, ScheduleChange, SettingChange, WindowCommand, COMMAND_HELP};
pub use observer::{NullObserver, ObservedEvent, RecordingObserver, SessionObserver, SessionSnapshot};
pub use runtime::Session;
pub use store::{PersistedState, Preferences, SavedTimer, StateStore, PREFERENCES_FILE, TIMER_FILE};
