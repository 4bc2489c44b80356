//! Backup engine for SaveWarden
//!
//! Keeps rolling autosaves of one externally-written save file and lets the
//! user pin any autosave as a permanent manual save.
//!
//! # Architecture
//!
//! - `naming`: sortable names for autosaves, manual saves and the staging file
//! - `retention`: the two-threshold autosave eviction rule
//! - `state`: directory scan and crash recovery
//! - `manager`: `BackupManager`, the capture / promote / restore operations
//! - `monitor`: `FileChangeMonitor`, debounced change detection
//! - `service`: `BackupService`, a thread that owns manager and monitor
//!
//! # Retention Policy
//!
//! An autosave is deleted only when there are more than `count_limit + 1`
//! autosaves *and* the oldest is older than `age_limit_ms` relative to the
//! newest capture. Manual saves are never deleted.
//!
//! # Example
//!
//! ```rust,ignore
//! use savewarden::backup::BackupManager;
//! use savewarden::config::Settings;
//!
//! let settings = Settings::new("ironman.sav", "backups");
//! let mut manager = BackupManager::open(&settings)?;
//! let latest = manager.autosaves().back().cloned().unwrap();
//! let manual = manager.promote(&latest, "before-boss")?;
//! manager.restore(&manual)?;
//! ```

pub mod manager;
pub mod monitor;
pub mod naming;
pub mod retention;
pub mod service;
pub mod state;

pub use manager::{BackupEvent, BackupManager, CaptureOutcome, QUICKSAVE_LABEL};
pub use monitor::{Debouncer, FileChangeMonitor};
pub use retention::RetentionPolicy;
pub use service::{BackupHandle, BackupService};
pub use state::BackupDirectoryState;
