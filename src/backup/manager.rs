//! Backup manager for SaveWarden
//!
//! Owns the logical state of the backup directory and implements the three
//! operations that change it: capturing an autosave, promoting an autosave to
//! a manual save, and restoring any backup over the watched file.
//!
//! # Capture protocol
//!
//! 1. Read the watched file's modification time.
//! 2. Copy the watched file to the staging file `_temp`.
//! 3. Read the modification time again; if it moved, the copy may mix two
//!    writes and is thrown away.
//! 4. Derive the autosave name from the modification time. If it equals the
//!    newest stored autosave nothing changed and the staging file is dropped.
//! 5. Otherwise rename the staging file into place and apply retention.
//!
//! Steps 1-3 failing yields [`CaptureOutcome::NotReady`]; the caller retries
//! later. The staging file never outlives a single capture attempt.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use filetime::FileTime;
use tracing::{debug, info, warn};

use super::naming::{autosave_name_for, is_autosave_name, manual_name, validate_label};
use super::retention::RetentionPolicy;
use super::state::{staging_path, BackupDirectoryState};
use crate::config::Settings;
use crate::error::{SaveWardenError, SaveWardenResult};

/// Label used by [`BackupManager::quicksave`]
pub const QUICKSAVE_LABEL: &str = "quicksave";

/// Result of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The source is missing, unreadable, or was written during the copy
    NotReady,
    /// The newest autosave already matches the source
    Unchanged,
    /// A new autosave was stored
    Captured {
        /// Name of the new autosave
        name: String,
        /// Number of old autosaves evicted afterwards
        evicted: usize,
    },
}

impl CaptureOutcome {
    /// Whether the attempt reached a final state (anything but `NotReady`)
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::NotReady)
    }
}

/// Notifications for subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupEvent {
    /// A new autosave was captured and `evicted` old ones were removed
    Autosaved { name: String, evicted: usize },
    /// An autosave was promoted to a new manual save
    ManualSaveCreated { name: String },
}

/// Manages autosaves and manual saves for one watched file
pub struct BackupManager {
    /// The file written by the game
    watched_file: PathBuf,
    /// Flat directory holding all backups
    backup_dir: PathBuf,
    /// Autosave eviction thresholds
    retention: RetentionPolicy,
    /// Current directory contents
    state: BackupDirectoryState,
    /// Event subscribers; dropped receivers are pruned on the next emit
    subscribers: Vec<mpsc::Sender<BackupEvent>>,
}

impl BackupManager {
    /// Load directory state without capturing
    ///
    /// Removes a leftover staging file before anything else. Callers that
    /// attach a file monitor do so after this and before
    /// [`BackupManager::initial_capture`].
    pub fn recover(settings: &Settings) -> SaveWardenResult<Self> {
        let state = BackupDirectoryState::recover(&settings.backup_dir)?;

        Ok(Self {
            watched_file: settings.watched_file.clone(),
            backup_dir: settings.backup_dir.clone(),
            retention: RetentionPolicy::new(
                settings.autosave_count_limit,
                settings.autosave_age_limit_ms,
            ),
            state,
            subscribers: Vec::new(),
        })
    }

    /// Load directory state and take the mandatory startup capture
    pub fn open(settings: &Settings) -> SaveWardenResult<Self> {
        let mut manager = Self::recover(settings)?;
        manager.initial_capture()?;
        Ok(manager)
    }

    /// Capture the watched file once; it must be readable right now
    pub fn initial_capture(&mut self) -> SaveWardenResult<CaptureOutcome> {
        match self.capture()? {
            CaptureOutcome::NotReady => Err(SaveWardenError::Integrity(format!(
                "Startup capture of {} failed; the save file must exist and be readable",
                self.watched_file.display()
            ))),
            outcome => Ok(outcome),
        }
    }

    /// Subscribe to capture and promotion events
    pub fn subscribe(&mut self) -> mpsc::Receiver<BackupEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: BackupEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Autosave names, oldest first
    pub fn autosaves(&self) -> &VecDeque<String> {
        &self.state.autosaves
    }

    /// Manual-save names in creation order
    pub fn manual_saves(&self) -> &[String] {
        &self.state.manual_saves
    }

    /// Full directory state
    pub fn state(&self) -> &BackupDirectoryState {
        &self.state
    }

    /// Attempt one capture of the watched file
    ///
    /// Only integrity problems are returned as errors: a staging file that is
    /// already present, or a candidate name older than the newest autosave.
    pub fn capture(&mut self) -> SaveWardenResult<CaptureOutcome> {
        self.capture_with(|_| {})
    }

    /// [`BackupManager::capture`] with a callback run between the copy and
    /// the second modification-time check
    fn capture_with<F>(&mut self, after_copy: F) -> SaveWardenResult<CaptureOutcome>
    where
        F: FnOnce(&Path),
    {
        let staging = staging_path(&self.backup_dir);
        if staging.exists() {
            return Err(SaveWardenError::Integrity(format!(
                "Staging file {} exists before capture",
                staging.display()
            )));
        }

        let pre_modified = match modified_time(&self.watched_file) {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "save file not readable, capture deferred");
                return Ok(CaptureOutcome::NotReady);
            }
        };

        if let Err(e) = fs::copy(&self.watched_file, &staging) {
            debug!(error = %e, "copy to staging failed, capture deferred");
            discard_staging(&staging)?;
            return Ok(CaptureOutcome::NotReady);
        }

        after_copy(&self.watched_file);

        let post_modified = match modified_time(&self.watched_file) {
            Ok(t) if t == pre_modified => t,
            _ => {
                debug!("save file changed during copy, capture deferred");
                discard_staging(&staging)?;
                return Ok(CaptureOutcome::NotReady);
            }
        };

        let name = autosave_name_for(post_modified);

        if let Some(latest) = self.state.latest_autosave() {
            if latest == name {
                discard_staging(&staging)?;
                debug!(name = %name, "save file unchanged since last capture");
                return Ok(CaptureOutcome::Unchanged);
            }
            if latest > name.as_str() {
                discard_staging(&staging)?;
                return Err(SaveWardenError::Integrity(format!(
                    "Autosave {} would sort before the newest autosave {}",
                    name, latest
                )));
            }
        }

        if let Err(e) = fs::rename(&staging, self.backup_dir.join(&name)) {
            warn!(error = %e, name = %name, "failed to move staging file into place");
            discard_staging(&staging)?;
            return Ok(CaptureOutcome::NotReady);
        }
        self.state.autosaves.push_back(name.clone());

        let evicted = self.evict(DateTime::<Utc>::from(post_modified));
        info!(name = %name, evicted, "captured autosave");

        self.emit(BackupEvent::Autosaved {
            name: name.clone(),
            evicted,
        });
        Ok(CaptureOutcome::Captured { name, evicted })
    }

    /// Drop the oldest autosaves the retention policy no longer keeps
    fn evict(&mut self, latest: DateTime<Utc>) -> usize {
        let count = self.retention.eviction_count(&self.state.autosaves, latest);

        for name in self.state.autosaves.drain(..count) {
            if let Err(e) = fs::remove_file(self.backup_dir.join(&name)) {
                warn!(error = %e, name = %name, "failed to delete evicted autosave");
            } else {
                debug!(name = %name, "evicted autosave");
            }
        }
        count
    }

    /// Copy an autosave into the manual-save namespace
    ///
    /// The manual id is consumed before the copy is attempted, so a failed
    /// copy leaves a permanent gap in the id sequence. The source autosave is
    /// left untouched.
    pub fn promote(&mut self, autosave: &str, label: &str) -> SaveWardenResult<String> {
        if !is_autosave_name(autosave) {
            return Err(SaveWardenError::Validation(format!(
                "Not an autosave name: {}",
                autosave
            )));
        }
        validate_label(label)?;

        let id = self.state.next_manual_id;
        self.state.next_manual_id += 1;
        let name = manual_name(id, label);
        let target = self.backup_dir.join(&name);

        if let Err(e) = fs::copy(self.backup_dir.join(autosave), &target) {
            let _ = fs::remove_file(&target);
            warn!(error = %e, autosave, id, "promotion copy failed");
            return Err(SaveWardenError::Io(format!(
                "Failed to copy {} to {}: {}",
                autosave, name, e
            )));
        }

        self.state.manual_saves.push(name.clone());
        info!(autosave, name = %name, "promoted autosave to manual save");

        self.emit(BackupEvent::ManualSaveCreated { name: name.clone() });
        Ok(name)
    }

    /// Promote the newest autosave under the `quicksave` label
    pub fn quicksave(&mut self) -> SaveWardenResult<String> {
        let latest = self
            .state
            .latest_autosave()
            .map(str::to_string)
            .ok_or_else(|| SaveWardenError::backup_not_found("latest autosave"))?;
        self.promote(&latest, QUICKSAVE_LABEL)
    }

    /// Replace the watched file with a stored backup
    ///
    /// The live file is deleted first and then recreated with a fresh
    /// modification time. Either step failing is an error; a live file that
    /// is already gone counts as a failed delete. A running file monitor sees
    /// both steps and schedules a capture, which stores the restored bytes as
    /// a new autosave.
    pub fn restore(&self, name: &str) -> SaveWardenResult<()> {
        if !self.state.contains(name) {
            return Err(SaveWardenError::backup_not_found(name));
        }
        let source = self.backup_dir.join(name);

        fs::remove_file(&self.watched_file).map_err(|e| {
            SaveWardenError::Io(format!(
                "Failed to remove {}: {}",
                self.watched_file.display(),
                e
            ))
        })?;

        if let Err(e) = fs::copy(&source, &self.watched_file) {
            let _ = fs::remove_file(&self.watched_file);
            return Err(SaveWardenError::Io(format!(
                "Failed to copy {} over {}: {}",
                name,
                self.watched_file.display(),
                e
            )));
        }

        filetime::set_file_mtime(&self.watched_file, FileTime::now()).map_err(|e| {
            SaveWardenError::Io(format!(
                "Failed to touch {}: {}",
                self.watched_file.display(),
                e
            ))
        })?;

        info!(name, path = %self.watched_file.display(), "restored backup");
        Ok(())
    }

    /// Restore the newest manual save
    pub fn quickload(&self) -> SaveWardenResult<String> {
        let latest = self
            .state
            .latest_manual_save()
            .map(str::to_string)
            .ok_or_else(|| SaveWardenError::backup_not_found("latest manual save"))?;
        self.restore(&latest)?;
        Ok(latest)
    }
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Remove the staging file; failing to do so leaves the directory unusable
fn discard_staging(staging: &Path) -> SaveWardenResult<()> {
    match fs::remove_file(staging) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SaveWardenError::Integrity(format!(
            "Failed to remove staging file {}: {}",
            staging.display(),
            e
        ))),
    }
}
