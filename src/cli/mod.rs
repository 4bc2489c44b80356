//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the clap
//! argument parsing with the backup engine. It plays the part of the user
//! interface: it loads the configuration, hands it to the engine and reports
//! results.

pub mod backup;
pub mod config;
pub mod watch;

pub use backup::{handle_backup_command, BackupCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use watch::run_watch;

use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;

/// Per-run overrides of the persisted settings
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Save file to watch
    #[arg(long, global = true, env = "SAVEWARDEN_SAVE_PATH")]
    pub save_path: Option<PathBuf>,

    /// Directory to keep backups in
    #[arg(long, global = true, env = "SAVEWARDEN_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Autosaves kept regardless of age
    #[arg(long, global = true)]
    pub count_limit: Option<u32>,

    /// Age in milliseconds after which surplus autosaves are deleted
    #[arg(long, global = true)]
    pub age_limit: Option<u64>,

    /// Capture retry interval in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,
}

impl SettingsOverrides {
    /// Check if any override was given
    pub fn is_empty(&self) -> bool {
        self.save_path.is_none()
            && self.backup_dir.is_none()
            && self.count_limit.is_none()
            && self.age_limit.is_none()
            && self.debounce_ms.is_none()
    }

    /// Apply the overrides on top of `settings`
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.save_path {
            settings.watched_file = path.clone();
        }
        if let Some(dir) = &self.backup_dir {
            settings.backup_dir = dir.clone();
        }
        if let Some(count) = self.count_limit {
            settings.autosave_count_limit = count;
        }
        if let Some(age) = self.age_limit {
            settings.autosave_age_limit_ms = age;
        }
        if let Some(ms) = self.debounce_ms {
            settings.debounce_ms = ms;
        }
    }
}
