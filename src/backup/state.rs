//! Logical state of the backup directory
//!
//! Rebuilt from a directory listing at startup: autosaves ascending by name,
//! manual saves ascending by id, and the id the next promotion will use.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::naming::{is_autosave_name, parse_manual_id, STAGING_NAME};
use crate::error::{SaveWardenError, SaveWardenResult};

/// Autosave and manual-save sequences of one backup directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupDirectoryState {
    /// Autosave names, oldest first
    pub autosaves: VecDeque<String>,
    /// Manual-save names, lowest id first
    pub manual_saves: Vec<String>,
    /// Id the next promotion will allocate
    pub next_manual_id: u32,
}

impl BackupDirectoryState {
    /// Scan `backup_dir` without touching anything
    pub fn scan(backup_dir: &Path) -> SaveWardenResult<Self> {
        let mut autosaves = Vec::new();
        let mut manual = Vec::new();

        for entry in fs::read_dir(backup_dir).map_err(|e| {
            SaveWardenError::Io(format!(
                "Failed to read backup directory {}: {}",
                backup_dir.display(),
                e
            ))
        })? {
            let entry = entry.map_err(|e| {
                SaveWardenError::Io(format!("Failed to read directory entry: {}", e))
            })?;

            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };

            if is_autosave_name(&name) {
                autosaves.push(name);
            } else if let Some(id) = parse_manual_id(&name) {
                manual.push((id, name));
            }
        }

        autosaves.sort();
        manual.sort();

        let next_manual_id = manual.last().map(|(id, _)| id + 1).unwrap_or(0);

        Ok(Self {
            autosaves: autosaves.into(),
            manual_saves: manual.into_iter().map(|(_, name)| name).collect(),
            next_manual_id,
        })
    }

    /// Remove a leftover staging file, then scan
    ///
    /// A staging file at rest means a capture was interrupted; its contents
    /// are never trusted.
    pub fn recover(backup_dir: &Path) -> SaveWardenResult<Self> {
        let staging = staging_path(backup_dir);
        if staging.exists() {
            fs::remove_file(&staging).map_err(|e| {
                SaveWardenError::Io(format!(
                    "Failed to remove leftover staging file {}: {}",
                    staging.display(),
                    e
                ))
            })?;
            info!(path = %staging.display(), "removed staging file left by interrupted capture");
        }

        let state = Self::scan(backup_dir)?;
        debug!(
            autosaves = state.autosaves.len(),
            manual_saves = state.manual_saves.len(),
            next_manual_id = state.next_manual_id,
            "scanned backup directory"
        );
        Ok(state)
    }

    /// Most recent autosave
    pub fn latest_autosave(&self) -> Option<&str> {
        self.autosaves.back().map(String::as_str)
    }

    /// Most recent manual save
    pub fn latest_manual_save(&self) -> Option<&str> {
        self.manual_saves.last().map(String::as_str)
    }

    /// Check if `name` is a stored backup of either kind
    pub fn contains(&self, name: &str) -> bool {
        self.autosaves.iter().any(|n| n == name) || self.manual_saves.iter().any(|n| n == name)
    }
}

/// Path of the staging file inside a backup directory
pub fn staging_path(backup_dir: &Path) -> PathBuf {
    backup_dir.join(STAGING_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let state = BackupDirectoryState::scan(temp.path()).unwrap();

        assert!(state.autosaves.is_empty());
        assert!(state.manual_saves.is_empty());
        assert_eq!(state.next_manual_id, 0);
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "auto_2024-01-02_00-00-00_000");
        touch(temp.path(), "auto_2023-12-31_23-59-59_999");
        touch(temp.path(), "auto_2024-01-01_12-00-00_500");
        touch(temp.path(), "m0002_castle");
        touch(temp.path(), "m0000_start");
        touch(temp.path(), "notes.txt");
        touch(temp.path(), "mystery");
        fs::create_dir(temp.path().join("m0009_dir")).unwrap();

        let state = BackupDirectoryState::scan(temp.path()).unwrap();

        assert_eq!(
            Vec::from(state.autosaves.clone()),
            vec![
                "auto_2023-12-31_23-59-59_999",
                "auto_2024-01-01_12-00-00_500",
                "auto_2024-01-02_00-00-00_000",
            ]
        );
        assert_eq!(state.manual_saves, vec!["m0000_start", "m0002_castle"]);
        assert_eq!(state.next_manual_id, 3);
        assert_eq!(state.latest_autosave(), Some("auto_2024-01-02_00-00-00_000"));
        assert_eq!(state.latest_manual_save(), Some("m0002_castle"));
        assert!(state.contains("m0000_start"));
        assert!(!state.contains("notes.txt"));
    }

    #[test]
    fn test_manual_ids_sort_numerically_past_four_digits() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "m9999_a");
        touch(temp.path(), "m10000_b");

        let state = BackupDirectoryState::scan(temp.path()).unwrap();
        assert_eq!(state.manual_saves, vec!["m9999_a", "m10000_b"]);
        assert_eq!(state.next_manual_id, 10001);
    }

    #[test]
    fn test_recover_removes_staging_file() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), STAGING_NAME);
        touch(temp.path(), "auto_2024-01-01_00-00-00_000");

        let state = BackupDirectoryState::recover(temp.path()).unwrap();

        assert!(!staging_path(temp.path()).exists());
        assert_eq!(state.autosaves.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = BackupDirectoryState::scan(&temp.path().join("absent"));
        assert!(matches!(result, Err(SaveWardenError::Io(_))));
    }
}
