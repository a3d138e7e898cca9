//! Change notifications for the shared directory.
//!
//! The notifier only wakes the event loop early. The poll interval keeps
//! running regardless, so a lost or missing notification costs latency,
//! never correctness.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::SyncError;

/// Signal sent from the watcher thread into the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    /// One of the watched files was replaced or created
    Changed,
    /// The notifier stopped; rely on polling from now on
    Unavailable { reason: String },
}

/// Handle to a running watcher thread. Dropping it stops dispatch.
///
/// The thread blocks in the kernel read and notices the stop flag on the
/// next directory event, so it may outlive the handle until then.
#[derive(Debug)]
pub struct SlotWatcher {
    stop: Arc<AtomicBool>,
}

impl SlotWatcher {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for SlotWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watches `dir` and signals when a file named in `names` changes.
#[cfg(target_os = "linux")]
pub fn spawn_slot_watcher(
    dir: &Path,
    names: &[&str],
    tx: mpsc::UnboundedSender<WatchSignal>,
) -> Result<SlotWatcher, SyncError> {
    use std::ffi::OsString;

    use nix::sys::inotify::{AddWatchFlags, InitFlags, Inotify};

    // Writers rename a finished temp file into place, so IN_MOVED_TO is the
    // event that matters; the others cover plain writers.
    let mask = AddWatchFlags::IN_CREATE | AddWatchFlags::IN_CLOSE_WRITE | AddWatchFlags::IN_MOVED_TO;

    let inotify = Inotify::init(InitFlags::IN_CLOEXEC)
        .map_err(|e| SyncError::WatcherUnavailable(format!("inotify init failed: {e}")))?;
    inotify.add_watch(dir, mask).map_err(|e| {
        SyncError::WatcherUnavailable(format!("inotify watch on {} failed: {e}", dir.display()))
    })?;

    let names: Vec<OsString> = names.iter().map(OsString::from).collect();
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);

    std::thread::Builder::new()
        .name("pomosync-watch".to_string())
        .spawn(move || {
            let inotify = inotify;
            loop {
                let events = match inotify.read_events() {
                    Ok(events) => events,
                    Err(e) => {
                        let _ = tx.send(WatchSignal::Unavailable {
                            reason: format!("inotify read failed: {e}"),
                        });
                        return;
                    }
                };
                if thread_stop.load(Ordering::SeqCst) {
                    return;
                }

                let mut changed = false;
                for event in events {
                    if event.mask.contains(AddWatchFlags::IN_Q_OVERFLOW) {
                        let _ = tx.send(WatchSignal::Unavailable {
                            reason: "inotify queue overflow (events may be lost)".to_string(),
                        });
                        return;
                    }
                    if event.name.as_ref().is_some_and(|name| names.contains(name)) {
                        changed = true;
                    }
                }

                if changed && tx.send(WatchSignal::Changed).is_err() {
                    return;
                }
            }
        })
        .map_err(|e| SyncError::WatcherUnavailable(format!("failed to spawn watcher: {e}")))?;

    tracing::debug!(dir = %dir.display(), "watching shared directory");
    Ok(SlotWatcher { stop })
}

/// Watches `dir` and signals when a file named in `names` changes.
#[cfg(not(target_os = "linux"))]
pub fn spawn_slot_watcher(
    _dir: &Path,
    _names: &[&str],
    _tx: mpsc::UnboundedSender<WatchSignal>,
) -> Result<SlotWatcher, SyncError> {
    Err(SyncError::WatcherUnavailable(
        "no change notifier on this platform; polling only".to_string(),
    ))
}
