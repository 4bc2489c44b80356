//! Configuration module for SaveWarden
//!
//! This module provides configuration management including:
//! - Config directory resolution
//! - Settings persistence (watched file, backup directory, retention limits)

pub mod paths;
pub mod settings;

pub use paths::SaveWardenPaths;
pub use settings::Settings;
