use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use savewarden::cli::{
    handle_backup_command, handle_config_command, run_watch, BackupCommands, ConfigCommands,
    SettingsOverrides,
};
use savewarden::config::{SaveWardenPaths, Settings};

#[derive(Parser)]
#[command(
    name = "savewarden",
    version,
    about = "Rolling autosaves and manual checkpoints for a single save file",
    long_about = "SaveWarden watches one save file and keeps timestamped autosaves of \
                  every version written to it, pruned by a count and age limit. Any \
                  autosave can be promoted to a permanent manual save, and any backup \
                  can be restored over the live file."
)]
struct Cli {
    /// Directory holding config.json (overrides SAVEWARDEN_CONFIG_DIR)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: SettingsOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the save file and keep autosaves until 'quit'
    Watch,

    #[command(flatten)]
    Backup(BackupCommands),

    /// Show or change the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    savewarden::logging::init(cli.verbose);

    let paths = match cli.config_dir {
        Some(dir) => SaveWardenPaths::with_base_dir(dir),
        None => SaveWardenPaths::new()?,
    };
    let mut settings = Settings::load_or_create(&paths)?;
    cli.overrides.apply(&mut settings);

    match cli.command {
        Some(Commands::Watch) => run_watch(settings)?,
        Some(Commands::Backup(cmd)) => handle_backup_command(&settings, cmd)?,
        Some(Commands::Config(cmd)) => {
            handle_config_command(&paths, &settings, &cli.overrides, cmd)?;
        }
        None => {
            println!("SaveWarden - rolling backups for a single save file");
            println!();
            println!("Run 'savewarden --help' for usage information.");
            if !paths.is_initialized() {
                println!(
                    "Get started with: savewarden config set --save-path <file> --backup-dir <dir>"
                );
            }
        }
    }

    Ok(())
}
