//! User settings for SaveWarden
//!
//! The settings value is the whole configuration the backup core needs: which
//! file to watch, where backups go, and the two autosave retention thresholds.
//! The core never reads or writes this file itself; the CLI loads it and
//! hands the value in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::SaveWardenPaths;
use crate::error::SaveWardenError;

/// Persisted configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// The save file written by the game
    #[serde(default)]
    pub watched_file: PathBuf,

    /// Flat directory holding autosaves, manual saves and the staging file
    #[serde(default)]
    pub backup_dir: PathBuf,

    /// Autosaves beyond this many become eligible for eviction
    #[serde(default = "default_count_limit")]
    pub autosave_count_limit: u32,

    /// Autosaves older than this (relative to the newest capture) become
    /// eligible for eviction
    #[serde(default = "default_age_limit_ms")]
    pub autosave_age_limit_ms: u64,

    /// Retry interval of the capture timer
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_schema_version() -> u32 {
    1
}

fn default_count_limit() -> u32 {
    50
}

fn default_age_limit_ms() -> u64 {
    24 * 60 * 60 * 1000
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            watched_file: PathBuf::new(),
            backup_dir: PathBuf::new(),
            autosave_count_limit: default_count_limit(),
            autosave_age_limit_ms: default_age_limit_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Settings {
    /// Build settings for a watched file and backup directory with default limits
    pub fn new(watched_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            watched_file: watched_file.into(),
            backup_dir: backup_dir.into(),
            ..Self::default()
        }
    }

    /// Capture retry interval as a Duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check that the configuration points at something usable
    ///
    /// The watched path must be an existing file and the backup directory an
    /// existing directory.
    pub fn validate(&self) -> Result<(), SaveWardenError> {
        if !self.watched_file.is_file() {
            return Err(SaveWardenError::Config(format!(
                "Save file does not exist: {}",
                self.watched_file.display()
            )));
        }
        if !self.backup_dir.is_dir() {
            return Err(SaveWardenError::Config(format!(
                "Backup directory does not exist: {}",
                self.backup_dir.display()
            )));
        }
        if self.debounce_ms == 0 {
            return Err(SaveWardenError::Config(
                "Debounce interval must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &SaveWardenPaths) -> Result<Self, SaveWardenError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                SaveWardenError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                SaveWardenError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SaveWardenPaths) -> Result<(), SaveWardenError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SaveWardenError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            SaveWardenError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.debounce(), Duration::from_millis(100));
        assert_eq!(settings.autosave_count_limit, 50);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SaveWardenPaths::with_base_dir(temp_dir.path().join("cfg"));

        let mut settings = Settings::new("/games/ironman.sav", "/games/backups");
        settings.autosave_count_limit = 7;
        settings.autosave_age_limit_ms = 60_000;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SaveWardenPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"watched_file": "a.sav"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.watched_file, PathBuf::from("a.sav"));
        assert_eq!(loaded.debounce_ms, 100);
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        let save = temp_dir.path().join("game.sav");
        std::fs::write(&save, b"state").unwrap();

        let ok = Settings::new(&save, temp_dir.path());
        assert!(ok.validate().is_ok());

        let swapped = Settings::new(temp_dir.path(), &save);
        assert!(matches!(
            swapped.validate(),
            Err(SaveWardenError::Config(_))
        ));

        let unset = Settings::default();
        assert!(unset.validate().is_err());
    }
}
