//! Backup CLI commands
//!
//! One-shot operations on the backup directory. Every command except `list`
//! opens a [`BackupManager`], which first captures the current save file.

use chrono::Utc;
use clap::Subcommand;

use crate::backup::{BackupDirectoryState, BackupManager, CaptureOutcome};
use crate::config::Settings;
use crate::display::format_backup_list;
use crate::error::SaveWardenResult;

/// Backup subcommands
#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// List autosaves and manual saves, newest first
    List {
        /// Show at most this many entries per list
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Copy an autosave to a permanent manual save
    Promote {
        /// Autosave name (e.g. auto_2024-05-01_12-00-00_000)
        autosave: String,
        /// Label for the manual save
        label: String,
    },

    /// Promote the most recent autosave as "quicksave"
    Quicksave,

    /// Replace the save file with a stored backup
    Restore {
        /// Autosave or manual-save name
        name: String,
    },

    /// Restore the most recent manual save
    Quickload,
}

/// Handle a backup command
pub fn handle_backup_command(settings: &Settings, cmd: BackupCommands) -> SaveWardenResult<()> {
    match cmd {
        BackupCommands::List { limit } => {
            let state = BackupDirectoryState::scan(&settings.backup_dir)?;
            print!("{}", format_backup_list(&state, limit, Utc::now()));
        }

        BackupCommands::Promote { autosave, label } => {
            let name = open_manager(settings)?.promote(&autosave, &label)?;
            println!("Created manual save: {}", name);
        }

        BackupCommands::Quicksave => {
            let name = open_manager(settings)?.quicksave()?;
            println!("Created manual save: {}", name);
        }

        BackupCommands::Restore { name } => {
            let mut manager = open_manager(settings)?;
            manager.restore(&name)?;
            println!("Restored {} to {}", name, settings.watched_file.display());
            capture_restored(&mut manager)?;
        }

        BackupCommands::Quickload => {
            let mut manager = open_manager(settings)?;
            let name = manager.quickload()?;
            println!("Restored {} to {}", name, settings.watched_file.display());
            capture_restored(&mut manager)?;
        }
    }

    Ok(())
}

fn open_manager(settings: &Settings) -> SaveWardenResult<BackupManager> {
    settings.validate()?;
    BackupManager::open(settings)
}

/// Without a running watcher, take the capture the restore would have triggered
fn capture_restored(manager: &mut BackupManager) -> SaveWardenResult<()> {
    if let CaptureOutcome::Captured { name, evicted } = manager.capture()? {
        println!("Autosaved restored state as {}", name);
        if evicted > 0 {
            println!("Evicted {} old autosave(s)", evicted);
        }
    }
    Ok(())
}
