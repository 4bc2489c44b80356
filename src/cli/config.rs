//! Configuration CLI commands

use clap::Subcommand;

use super::SettingsOverrides;
use crate::config::{SaveWardenPaths, Settings};
use crate::error::SaveWardenResult;

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Persist the given --save-path/--backup-dir/--count-limit/--age-limit/--debounce-ms
    Set,
}

/// Handle a config command
///
/// `settings` already has the command-line overrides applied.
pub fn handle_config_command(
    paths: &SaveWardenPaths,
    settings: &Settings,
    overrides: &SettingsOverrides,
    cmd: ConfigCommands,
) -> SaveWardenResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("SaveWarden Configuration");
            println!("========================");
            println!("Config file:      {}", paths.settings_file().display());
            println!("Save file:        {}", settings.watched_file.display());
            println!("Backup directory: {}", settings.backup_dir.display());
            println!("Count limit:      {}", settings.autosave_count_limit);
            println!("Age limit:        {} ms", settings.autosave_age_limit_ms);
            println!("Debounce:         {} ms", settings.debounce_ms);
            println!();
            match settings.validate() {
                Ok(()) => println!("Status: ready"),
                Err(e) => println!("Status: {}", e),
            }
        }

        ConfigCommands::Set => {
            if overrides.is_empty() {
                println!("Nothing to change.");
                println!("Pass any of --save-path, --backup-dir, --count-limit, --age-limit, --debounce-ms");
                return Ok(());
            }
            settings.save(paths)?;
            println!("Saved configuration to {}", paths.settings_file().display());
            if let Err(e) = settings.validate() {
                println!("Warning: {}", e);
            }
        }
    }

    Ok(())
}
