//! CLI module for pomosync.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `input`: Interactive stdin reader for a window
//! - `display`: Output formatting and the console observer

pub mod commands;
pub mod display;
pub mod input;

pub use commands::{Cli, Commands, DirArgs, SendAction, SendArgs, WindowArgs};
pub use display::{ConsoleObserver, Display};
pub use input::{read_commands, spawn_stdin_reader};
