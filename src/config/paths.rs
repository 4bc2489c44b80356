//! Path management for SaveWarden
//!
//! Resolves where the persisted configuration lives. The backup directory
//! itself is user-chosen and stored in [`super::Settings`].
//!
//! ## Path Resolution Order
//!
//! 1. `SAVEWARDEN_CONFIG_DIR` environment variable (if set)
//! 2. The platform config directory from `directories::ProjectDirs`
//!    (`~/.config/savewarden` on Linux, `%APPDATA%\savewarden\config` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::SaveWardenError;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "SAVEWARDEN_CONFIG_DIR";

/// Manages the paths used by SaveWarden
#[derive(Debug, Clone)]
pub struct SaveWardenPaths {
    /// Directory holding `config.json`
    base_dir: PathBuf,
}

impl SaveWardenPaths {
    /// Create a new SaveWardenPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and no override
    /// is set.
    pub fn new() -> Result<Self, SaveWardenError> {
        let base_dir = if let Ok(custom) = std::env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "savewarden")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    SaveWardenError::Config("Could not determine config directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create SaveWardenPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the config directory exists
    pub fn ensure_directories(&self) -> Result<(), SaveWardenError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            SaveWardenError::Io(format!("Failed to create config directory: {}", e))
        })
    }

    /// Check if a configuration has been saved
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
