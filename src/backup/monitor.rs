//! Change detection for the watched save file
//!
//! Games rarely write a save in one go, so a change notification only marks a
//! capture as pending and (re)starts a fixed-delay timer. Each time the timer
//! fires one capture is attempted:
//!
//! - `NotReady` keeps the timer running for another round
//! - any settled outcome clears the pending flag, stops the timer and
//!   re-registers the watch
//!
//! The re-registration matters on platforms where deleting and recreating the
//! file silently drops the watch.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use super::manager::CaptureOutcome;
use crate::error::SaveWardenResult;

/// Pending flag plus a restartable fixed-delay timer
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: bool,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create an idle debouncer
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: false,
            deadline: None,
        }
    }

    /// Record a change notification; restarts the timer, never extends it
    pub fn notify(&mut self, now: Instant) {
        self.pending = true;
        self.deadline = Some(now + self.delay);
    }

    /// Whether a capture is outstanding
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// When the timer fires next, if it is running
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the timer has fired
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Feed back the result of a capture attempt made when the timer fired
    ///
    /// Returns `true` when the attempt settled and the watch should be re-armed.
    pub fn settle(&mut self, outcome: &CaptureOutcome, now: Instant) -> bool {
        if outcome.is_settled() {
            self.pending = false;
            self.deadline = None;
            true
        } else {
            self.deadline = Some(now + self.delay);
            false
        }
    }
}

/// Watches one file and decides when to attempt captures
pub struct FileChangeMonitor {
    path: PathBuf,
    watcher: RecommendedWatcher,
    debouncer: Debouncer,
}

impl FileChangeMonitor {
    /// Start watching `path`
    ///
    /// `on_change` runs on the watcher's thread for every relevant
    /// notification; it should only forward the signal to the owner of this
    /// monitor, which then calls [`FileChangeMonitor::file_changed`].
    pub fn new<F>(path: &Path, delay: Duration, on_change: F) -> SaveWardenResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if is_relevant(&event.kind) => {
                    trace!(kind = ?event.kind, "save file notification");
                    on_change();
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "file watcher error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        debug!(path = %path.display(), "watching save file");

        Ok(Self {
            path: path.to_path_buf(),
            watcher,
            debouncer: Debouncer::new(delay),
        })
    }

    /// Handle a forwarded change notification
    pub fn file_changed(&mut self, now: Instant) {
        self.debouncer.notify(now);
    }

    /// When the owner must call [`FileChangeMonitor::tick`] next
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Whether a capture is outstanding
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Run one capture attempt if the timer has fired
    ///
    /// Returns `Ok(None)` when nothing was due. Errors from `attempt` are
    /// passed through untouched and leave the timer running.
    pub fn tick<F>(
        &mut self,
        now: Instant,
        attempt: F,
    ) -> SaveWardenResult<Option<CaptureOutcome>>
    where
        F: FnOnce() -> SaveWardenResult<CaptureOutcome>,
    {
        if !self.debouncer.is_due(now) {
            return Ok(None);
        }

        let outcome = attempt()?;
        if self.debouncer.settle(&outcome, Instant::now()) {
            self.rearm();
        }
        Ok(Some(outcome))
    }

    /// Re-register the watch on the save file
    fn rearm(&mut self) {
        // The old registration may already be gone; that is the point
        let _ = self.watcher.unwatch(&self.path);
        match self.watcher.watch(&self.path, RecursiveMode::NonRecursive) {
            Ok(()) => trace!(path = %self.path.display(), "watch re-armed"),
            Err(e) => warn!(error = %e, path = %self.path.display(), "failed to re-arm watch"),
        }
    }
}

/// Reads of the save file (including our own copies) are not changes
fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}
