//! Command definitions for the pomosync CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::session::WindowCommand;
use crate::sync::default_shared_dir;

// ============================================================================
// CLI Structure
// ============================================================================

/// pomosync - one Pomodoro timer shared by every window on this machine
#[derive(Parser, Debug)]
#[command(
    name = "pomosync",
    version,
    about = "Pomodoro timer and focus mode shared across processes",
    long_about = "Runs one participant of a Pomodoro session per window. Participants \
                  that share a directory see each other's timer, focus mode and \
                  end-of-shift decisions.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one participant, reading commands from stdin
    Window(WindowArgs),

    /// Perform one timer action as a short-lived participant
    Send(SendArgs),

    /// Show the shared slots and saved state without changing anything
    Status(DirArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Location of the shared directory.
#[derive(Args, Debug, Clone, Default)]
pub struct DirArgs {
    /// Shared directory (defaults to the user data directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl DirArgs {
    /// The given directory, or the per-user default.
    pub fn resolve(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_shared_dir)
    }
}

/// Arguments for the window command
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    #[command(flatten)]
    pub dir: DirArgs,

    /// Poll interval in milliseconds (50-2500)
    #[arg(
        long,
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(50..=2_500)
    )]
    pub poll_ms: Option<u64>,

    /// Disable the file change notifier and rely on polling alone
    #[arg(long)]
    pub no_watch: bool,
}

/// Arguments for the send command
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Timer action to perform
    #[arg(value_enum)]
    pub action: SendAction,

    #[command(flatten)]
    pub dir: DirArgs,
}

/// Timer actions available to `send`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendAction {
    Start,
    Pause,
    Skip,
    Reset,
}

impl SendAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendAction::Start => "start",
            SendAction::Pause => "pause",
            SendAction::Skip => "skip",
            SendAction::Reset => "reset",
        }
    }
}

impl From<SendAction> for WindowCommand {
    fn from(action: SendAction) -> Self {
        match action {
            SendAction::Start => WindowCommand::Start,
            SendAction::Pause => WindowCommand::Pause,
            SendAction::Skip => WindowCommand::Skip,
            SendAction::Reset => WindowCommand::Reset,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
