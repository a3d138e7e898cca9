//! Focus mode: hide editor elements while working.
//!
//! [`FocusMode`] holds whether the mode is on and which elements stay
//! visible. Actually changing the editor is delegated to a
//! [`ModeApplier`], the seam to the external settings toggler.
//!
//! # Error Handling
//!
//! Applier errors are logged and dropped. Focus mode state, and the
//! broadcast that follows a local change, never depend on the editor
//! accepting the change.

mod applier;
mod error;
mod focus;
mod presets;

pub use applier::{ApplierCall, LoggingModeApplier, MockModeApplier, ModeApplier};
pub use error::ModeError;
pub use focus::{FocusMode, ModeEvent};
pub use presets::{built_in_presets, Preset, PresetLibrary};
