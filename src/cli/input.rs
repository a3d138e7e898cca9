//! Interactive input for a window.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

use super::display::Display;
use crate::session::WindowCommand;

/// Reads commands from stdin on a dedicated thread.
///
/// Unparseable lines are reported and skipped. The thread ends at end of
/// input or once the receiving session is gone; dropping `tx` then closes
/// the command channel.
pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<WindowCommand>) -> io::Result<()> {
    thread::Builder::new()
        .name("pomosync-stdin".to_string())
        .spawn(move || read_commands(io::stdin().lock(), &tx))?;
    Ok(())
}

/// Forwards every command in `input` until it ends or `tx` closes.
///
/// Returns the number of commands forwarded.
pub fn read_commands(input: impl BufRead, tx: &mpsc::UnboundedSender<WindowCommand>) -> usize {
    let mut forwarded = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<WindowCommand>() {
            Ok(command) => {
                if tx.send(command).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(reason) => Display::show_error(&reason),
        }
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_commands_skips_bad_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input = Cursor::new("start\n\nwarp 9\nset work 40\nquit\n");

        assert_eq!(read_commands(input, &tx), 3);
        assert_eq!(rx.try_recv().unwrap(), WindowCommand::Start);
        assert!(matches!(rx.try_recv().unwrap(), WindowCommand::Set(_)));
        assert_eq!(rx.try_recv().unwrap(), WindowCommand::Quit);
    }

    #[test]
    fn test_read_commands_stops_when_session_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        assert_eq!(read_commands(Cursor::new("start\npause\n"), &tx), 0);
    }
}
