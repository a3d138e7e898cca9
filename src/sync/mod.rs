//! Cross-process coordination through a shared directory.
//!
//! Participants on one machine share two files:
//!
//! - `window-sync.json`: the latest state change, broadcast by whoever
//!   made it ([`BroadcastChannel`])
//! - `schedule-coord.json`: a single-owner claim on a one-shot decision
//!   ([`LeaderClaim`])
//!
//! There is no server. Exclusive file creation is the only mutual-exclusion
//! primitive; everything else is last-write-wins, detected by polling and
//! (on Linux) by inotify.
//!
//! # Error Handling
//!
//! Transient I/O failures, stale records and malformed records are logged
//! and swallowed. Only [`LeaderClaim::try_claim`] and
//! [`LeaderClaim::resolve`] return [`SyncError`], and callers degrade those
//! to independent operation.

pub mod broadcast;
pub mod claim;
pub mod clock;
pub mod config;
pub mod error;
pub mod slot;
pub mod watcher;

pub use broadcast::{BroadcastChannel, PublishOutcome, Rejection, BROADCAST_FILE};
pub use claim::{ClaimOutcome, ClaimResolution, LeaderClaim, CLAIM_FILE};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::{default_shared_dir, SyncConfig, CONFIG_FILE};
pub use error::{ConfigError, SyncError};
pub use slot::SharedSlot;
pub use watcher::{spawn_slot_watcher, SlotWatcher, WatchSignal};
