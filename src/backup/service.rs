//! Background backup service
//!
//! One thread owns the [`BackupManager`] and its [`FileChangeMonitor`].
//! Watcher notifications, timer expiries and user requests all arrive on a
//! single channel and are handled strictly one at a time, so captures,
//! promotions and restores never interleave and no locking is needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use savewarden::backup::{BackupEvent, BackupService};
//! use savewarden::config::Settings;
//!
//! let handle = BackupService::start(Settings::new("game.sav", "backups"))?;
//! let events = handle.subscribe()?;
//! if let Ok(BackupEvent::Autosaved { name, evicted }) = events.recv() {
//!     println!("{name} (+{evicted} evicted)");
//! }
//! handle.shutdown()?;
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info};

use super::manager::{BackupEvent, BackupManager};
use super::monitor::FileChangeMonitor;
use super::state::BackupDirectoryState;
use crate::config::Settings;
use crate::error::{SaveWardenError, SaveWardenResult};

type Reply<T> = Sender<SaveWardenResult<T>>;

/// Requests handled by the service thread
enum Message {
    FileChanged,
    Promote {
        autosave: String,
        label: String,
        reply: Reply<String>,
    },
    Quicksave {
        reply: Reply<String>,
    },
    Restore {
        name: String,
        reply: Reply<()>,
    },
    Quickload {
        reply: Reply<String>,
    },
    Snapshot {
        reply: Reply<BackupDirectoryState>,
    },
    Subscribe {
        reply: Reply<Receiver<BackupEvent>>,
    },
    Shutdown,
}

/// Starts the backup service thread
pub struct BackupService;

impl BackupService {
    /// Validate the settings, bring up the manager and monitor, and spawn the
    /// service thread
    ///
    /// The startup sequence is: remove any leftover staging file, scan the
    /// backup directory, attach the file monitor, take the startup capture.
    /// A failed startup capture is an integrity error and nothing is spawned.
    pub fn start(settings: Settings) -> SaveWardenResult<BackupHandle> {
        settings.validate()?;

        let mut manager = BackupManager::recover(&settings)?;

        let (sender, receiver) = mpsc::channel();
        let watcher_sender = sender.clone();
        let monitor = FileChangeMonitor::new(&settings.watched_file, settings.debounce(), move || {
            let _ = watcher_sender.send(Message::FileChanged);
        })?;

        manager.initial_capture()?;
        info!(
            save = %settings.watched_file.display(),
            backups = %settings.backup_dir.display(),
            autosaves = manager.autosaves().len(),
            manual_saves = manager.manual_saves().len(),
            "backup service started"
        );

        let thread = thread::Builder::new()
            .name("savewarden-backup".into())
            .spawn(move || run(manager, monitor, receiver))
            .map_err(|e| {
                SaveWardenError::Service(format!("Failed to spawn service thread: {}", e))
            })?;

        Ok(BackupHandle {
            sender,
            thread: Some(thread),
        })
    }
}

/// Service loop; returns only on shutdown or an integrity error
fn run(
    mut manager: BackupManager,
    mut monitor: FileChangeMonitor,
    receiver: Receiver<Message>,
) -> SaveWardenResult<()> {
    loop {
        let now = Instant::now();
        if let Some(outcome) = monitor
            .tick(now, || manager.capture())
            .inspect_err(|e| error!(error = %e, "capture failed fatally, stopping service"))?
        {
            debug!(?outcome, "capture attempt");
            continue;
        }

        let message = match monitor.deadline() {
            Some(deadline) => match receiver.recv_timeout(deadline.saturating_duration_since(now)) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            },
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => return Ok(()),
            },
        };

        match message {
            Message::FileChanged => monitor.file_changed(Instant::now()),
            Message::Promote {
                autosave,
                label,
                reply,
            } => {
                let _ = reply.send(manager.promote(&autosave, &label));
            }
            Message::Quicksave { reply } => {
                let _ = reply.send(manager.quicksave());
            }
            Message::Restore { name, reply } => {
                let result = manager.restore(&name);
                if result.is_ok() {
                    // Capture the restored file even if the watcher missed the swap
                    monitor.file_changed(Instant::now());
                }
                let _ = reply.send(result);
            }
            Message::Quickload { reply } => {
                let result = manager.quickload();
                if result.is_ok() {
                    monitor.file_changed(Instant::now());
                }
                let _ = reply.send(result);
            }
            Message::Snapshot { reply } => {
                let _ = reply.send(Ok(manager.state().clone()));
            }
            Message::Subscribe { reply } => {
                let _ = reply.send(Ok(manager.subscribe()));
            }
            Message::Shutdown => {
                info!("backup service stopping");
                return Ok(());
            }
        }
    }
}

/// Client side of a running backup service
///
/// Dropping the handle stops the service and waits for its thread.
pub struct BackupHandle {
    sender: Sender<Message>,
    thread: Option<JoinHandle<SaveWardenResult<()>>>,
}

impl BackupHandle {
    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Message) -> SaveWardenResult<T> {
        let (reply, response) = mpsc::channel();
        self.sender.send(make(reply)).map_err(|_| service_stopped())?;
        response.recv().map_err(|_| service_stopped())?
    }

    /// Report a change to the watched file, exactly as the watcher would
    pub fn notify_changed(&self) -> SaveWardenResult<()> {
        self.sender
            .send(Message::FileChanged)
            .map_err(|_| service_stopped())
    }

    /// Promote an autosave to a manual save with the given label
    pub fn promote(&self, autosave: &str, label: &str) -> SaveWardenResult<String> {
        self.request(|reply| Message::Promote {
            autosave: autosave.to_string(),
            label: label.to_string(),
            reply,
        })
    }

    /// Promote the newest autosave as `quicksave`
    pub fn quicksave(&self) -> SaveWardenResult<String> {
        self.request(|reply| Message::Quicksave { reply })
    }

    /// Restore a stored backup over the watched file
    pub fn restore(&self, name: &str) -> SaveWardenResult<()> {
        self.request(|reply| Message::Restore {
            name: name.to_string(),
            reply,
        })
    }

    /// Restore the newest manual save; returns its name
    pub fn quickload(&self) -> SaveWardenResult<String> {
        self.request(|reply| Message::Quickload { reply })
    }

    /// Copy of the current directory state
    pub fn snapshot(&self) -> SaveWardenResult<BackupDirectoryState> {
        self.request(|reply| Message::Snapshot { reply })
    }

    /// Autosave names, oldest first
    pub fn autosaves(&self) -> SaveWardenResult<Vec<String>> {
        Ok(self.snapshot()?.autosaves.into())
    }

    /// Manual-save names in creation order
    pub fn manual_saves(&self) -> SaveWardenResult<Vec<String>> {
        Ok(self.snapshot()?.manual_saves)
    }

    /// Subscribe to capture and promotion events
    pub fn subscribe(&self) -> SaveWardenResult<Receiver<BackupEvent>> {
        self.request(|reply| Message::Subscribe { reply })
    }

    /// Stop the service and return how its loop ended
    pub fn shutdown(mut self) -> SaveWardenResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> SaveWardenResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // The loop may already have exited on its own
        let _ = self.sender.send(Message::Shutdown);
        thread
            .join()
            .map_err(|_| SaveWardenError::Service("Backup service thread panicked".into()))?
    }
}

impl Drop for BackupHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "backup service ended with an error");
        }
    }
}

fn service_stopped() -> SaveWardenError {
    SaveWardenError::Service("Backup service is not running".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    fn setup() -> (TempDir, Settings) {
        let temp = TempDir::new().unwrap();
        let backups = temp.path().join("backups");
        fs::create_dir(&backups).unwrap();
        let save = temp.path().join("ironman.sav");
        write_save(&save, b"turn 0", 1_600_000_000);

        let mut settings = Settings::new(save, backups);
        settings.debounce_ms = 20;
        (temp, settings)
    }

    fn write_save(path: &Path, contents: &[u8], unix_secs: i64) {
        fs::write(path, contents).unwrap();
        filetime::set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
    }

    #[test]
    fn test_start_takes_initial_capture() {
        let (_temp, settings) = setup();
        let handle = BackupService::start(settings).unwrap();

        assert_eq!(handle.autosaves().unwrap().len(), 1);
        assert!(handle.manual_saves().unwrap().is_empty());
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_start_rejects_invalid_settings() {
        let (temp, settings) = setup();
        let bad = Settings::new(temp.path().join("nope.sav"), settings.backup_dir);
        assert!(matches!(
            BackupService::start(bad),
            Err(SaveWardenError::Config(_))
        ));
    }

    #[test]
    fn test_change_notification_triggers_capture() {
        let (_temp, settings) = setup();
        let handle = BackupService::start(settings.clone()).unwrap();
        let events = handle.subscribe().unwrap();

        write_save(&settings.watched_file, b"turn 1", 1_600_000_100);
        handle.notify_changed().unwrap();

        match events.recv_timeout(WAIT).unwrap() {
            BackupEvent::Autosaved { name, evicted } => {
                assert_eq!(evicted, 0);
                assert_eq!(fs::read(settings.backup_dir.join(&name)).unwrap(), b"turn 1");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(handle.autosaves().unwrap().len(), 2);
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_promote_and_restore_round_trip() {
        let (_temp, settings) = setup();
        let handle = BackupService::start(settings.clone()).unwrap();
        let events = handle.subscribe().unwrap();

        let first = handle.autosaves().unwrap()[0].clone();
        let manual = handle.promote(&first, "boss1").unwrap();
        assert_eq!(manual, "m0000_boss1");
        assert_eq!(
            events.recv_timeout(WAIT).unwrap(),
            BackupEvent::ManualSaveCreated {
                name: manual.clone()
            }
        );

        write_save(&settings.watched_file, b"party wiped", 1_600_000_500);
        handle.restore(&manual).unwrap();
        assert_eq!(fs::read(&settings.watched_file).unwrap(), b"turn 0");

        // The restore itself is picked up as a fresh autosave. The watcher may
        // also have captured the "party wiped" write just before it.
        loop {
            if let BackupEvent::Autosaved { name, .. } = events.recv_timeout(WAIT).unwrap() {
                if fs::read(settings.backup_dir.join(&name)).unwrap() == b"turn 0" {
                    break;
                }
            }
        }
        assert_eq!(handle.manual_saves().unwrap(), vec![manual]);
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_quicksave_quickload() {
        let (_temp, settings) = setup();
        let handle = BackupService::start(settings.clone()).unwrap();

        assert_eq!(handle.quicksave().unwrap(), "m0000_quicksave");
        write_save(&settings.watched_file, b"later", 1_600_000_900);
        assert_eq!(handle.quickload().unwrap(), "m0000_quicksave");
        assert_eq!(fs::read(&settings.watched_file).unwrap(), b"turn 0");
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_fatal_capture_stops_service() {
        let (_temp, settings) = setup();
        let handle = BackupService::start(settings.clone()).unwrap();

        // A save older than the newest autosave breaks name ordering
        write_save(&settings.watched_file, b"rewound", 1_500_000_000);
        handle.notify_changed().unwrap();

        let deadline = Instant::now() + WAIT;
        while handle.snapshot().is_ok() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(handle.snapshot(), Err(SaveWardenError::Service(_))));
        assert!(handle.shutdown().unwrap_err().is_fatal());
    }
}
