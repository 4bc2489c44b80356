//! SaveWarden - rolling backups for a single save file
//!
//! This library keeps historical versions of one externally-modified file
//! (typically a game's single "ironman" save) so that a destructive overwrite
//! can be undone. Changes are captured as timestamped autosaves, which are
//! pruned by a count/age retention policy, and any autosave can be promoted
//! to a manual save that is never deleted automatically.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration paths and persisted settings
//! - `error`: Custom error types
//! - `backup`: Capture protocol, retention, promotion, restore, file monitor
//!   and the background service
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `savewarden` binary
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use savewarden::backup::BackupService;
//! use savewarden::config::{SaveWardenPaths, Settings};
//!
//! let paths = SaveWardenPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let handle = BackupService::start(settings)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;

pub use error::{SaveWardenError, SaveWardenResult};
