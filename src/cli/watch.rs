//! The `watch` command
//!
//! Runs the backup service in the foreground, prints every capture and
//! promotion, and accepts line commands on stdin until `quit` or EOF.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use chrono::Utc;

use crate::backup::{BackupHandle, BackupService};
use crate::config::Settings;
use crate::display::{format_backup_list, format_event};
use crate::error::{SaveWardenError, SaveWardenResult};

const HELP: &str = "\
Commands:
  promote <autosave> <label>   copy an autosave to a manual save
  restore <name>               restore an autosave or manual save
  quicksave                    promote the newest autosave as \"quicksave\"
  quickload                    restore the newest manual save
  list [n]                     show backups, newest first
  help                         show this text
  quit                         stop watching";

/// A line typed while watching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Promote { autosave: String, label: String },
    Restore { name: String },
    Quicksave,
    Quickload,
    List { limit: Option<usize> },
    Help,
    Quit,
}

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse_command(line: &str) -> Result<Option<WatchCommand>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(None),
        "promote" | "p" => {
            let (autosave, label) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: promote <autosave> <label>".to_string())?;
            WatchCommand::Promote {
                autosave: autosave.to_string(),
                label: label.trim().to_string(),
            }
        }
        "restore" | "r" if !rest.is_empty() => WatchCommand::Restore {
            name: rest.to_string(),
        },
        "restore" | "r" => return Err("usage: restore <name>".into()),
        "quicksave" | "qs" => WatchCommand::Quicksave,
        "quickload" | "ql" => WatchCommand::Quickload,
        "list" | "ls" if rest.is_empty() => WatchCommand::List { limit: None },
        "list" | "ls" => WatchCommand::List {
            limit: Some(
                rest.parse()
                    .map_err(|_| format!("not a number: {}", rest))?,
            ),
        },
        "help" | "?" => WatchCommand::Help,
        "quit" | "exit" | "q" => WatchCommand::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

/// Input to the foreground loop
enum Input {
    Line(String),
    /// stdin closed or failed
    Eof,
    /// The event stream closed, so the service thread has exited
    ServiceStopped,
}

/// Run the service until the user quits or the service stops on its own
///
/// stdin is read on a helper thread so a service that dies on an integrity
/// error ends the command immediately instead of waiting for the next line.
pub fn run_watch(settings: Settings) -> SaveWardenResult<()> {
    let handle = BackupService::start(settings.clone())?;
    let events = handle.subscribe()?;
    let (input_tx, input_rx) = mpsc::channel();

    let printer_tx = input_tx.clone();
    let printer = thread::spawn(move || {
        for event in events {
            println!("{}", format_event(&event));
        }
        let _ = printer_tx.send(Input::ServiceStopped);
    });

    // Blocks on stdin for the life of the process; never joined
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(Input::Eof);
    });

    println!(
        "Watching {} (backups in {})",
        settings.watched_file.display(),
        settings.backup_dir.display()
    );
    println!("Type 'help' for commands.");

    while let Ok(input) = input_rx.recv() {
        let line = match input {
            Input::Line(line) => line,
            Input::Eof => break,
            Input::ServiceStopped => {
                eprintln!("Backup service stopped");
                break;
            }
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };
        if command == WatchCommand::Quit {
            break;
        }

        match execute(&handle, command) {
            Ok(()) => {}
            Err(e @ SaveWardenError::Service(_)) => {
                eprintln!("Error: {}", e);
                break;
            }
            Err(e) => eprintln!("Error: {}", e),
        }
        let _ = io::stdout().flush();
    }

    let result = handle.shutdown();
    let _ = printer.join();
    result
}

fn execute(handle: &BackupHandle, command: WatchCommand) -> SaveWardenResult<()> {
    match command {
        WatchCommand::Promote { autosave, label } => {
            handle.promote(&autosave, &label)?;
        }
        WatchCommand::Restore { name } => {
            handle.restore(&name)?;
            println!("restored {}", name);
        }
        WatchCommand::Quicksave => {
            handle.quicksave()?;
        }
        WatchCommand::Quickload => {
            let name = handle.quickload()?;
            println!("restored {}", name);
        }
        WatchCommand::List { limit } => {
            print!("{}", format_backup_list(&handle.snapshot()?, limit, Utc::now()));
        }
        WatchCommand::Help => println!("{}", HELP),
        WatchCommand::Quit => {}
    }
    Ok(())
}
