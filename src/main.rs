//! pomosync - one Pomodoro timer shared by every window on this machine
//!
//! Each `pomosync window` is one participant. Participants that share a
//! directory mirror each other's timer and focus mode, and only one of them
//! asks when the shift is over.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use pomosync::cli::{
    spawn_stdin_reader, Cli, Commands, ConsoleObserver, DirArgs, Display, SendArgs, WindowArgs,
};
use pomosync::mode::LoggingModeApplier;
use pomosync::session::{NullObserver, Session, StateStore};
use pomosync::sync::{Clock, SharedSlot, SyncConfig, SystemClock, BROADCAST_FILE, CLAIM_FILE};
use pomosync::types::{ClaimRecord, SyncEnvelope};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Window(args)) => run_window(args).await?,
        Some(Commands::Send(args)) => send_action(args)?,
        Some(Commands::Status(args)) => show_status(&args),
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn load_config(dir: &Path) -> Result<SyncConfig> {
    SyncConfig::load(dir).with_context(|| format!("Failed to load configuration from {}", dir.display()))
}

/// Runs one interactive participant until `quit`, end of input or Ctrl-C.
async fn run_window(args: WindowArgs) -> Result<()> {
    let dir = args.dir.resolve();
    let mut config = load_config(&dir)?;
    if let Some(ms) = args.poll_ms {
        config = config.with_poll_interval_ms(ms);
    }
    if args.no_watch {
        config = config.with_watch_enabled(false);
    }

    let mut session = Session::new(
        config,
        &dir,
        Arc::new(SystemClock),
        Box::new(LoggingModeApplier),
        Box::new(ConsoleObserver::new()),
    )?;
    Display::show_window_banner(session.origin_id(), &dir);

    let (tx, rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(tx).context("Failed to start the input reader")?;

    let interrupted = tokio::select! {
        result = session.run(rx) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::info!("interrupted");
        session.dispose();
    }
    Ok(())
}

/// Performs one timer action as a short-lived participant.
fn send_action(args: SendArgs) -> Result<()> {
    let dir = args.dir.resolve();
    let config = load_config(&dir)?.with_watch_enabled(false);

    let mut session = Session::new(
        config,
        &dir,
        Arc::new(SystemClock),
        Box::new(LoggingModeApplier),
        Box::new(NullObserver),
    )?;
    session.initial_sync();
    session.handle_command(args.action.into());
    session.dispose();

    Display::show_sent(args.action, &session.state());
    Ok(())
}

/// Prints the shared slots and the saved state. Writes nothing.
fn show_status(args: &DirArgs) {
    let dir = args.resolve();
    let envelope: Option<SyncEnvelope> = SharedSlot::new(dir.join(BROADCAST_FILE)).read();
    let claim: Option<ClaimRecord> = SharedSlot::new(dir.join(CLAIM_FILE)).read();
    let saved = StateStore::new(&dir).load();

    Display::show_shared_status(
        &dir,
        envelope.as_ref(),
        claim.as_ref(),
        &saved,
        SystemClock.now_ms(),
    );
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
