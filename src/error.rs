//! Custom error types for SaveWarden
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.
//!
//! Capture attempts that simply are not ready yet (source missing, source
//! rewritten mid-copy) are *not* errors; they are reported through
//! [`crate::backup::CaptureOutcome::NotReady`]. Only integrity problems escape
//! the capture pipeline.

use thiserror::Error;

/// The main error type for SaveWarden operations
#[derive(Error, Debug)]
pub enum SaveWardenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid user input (labels, names)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The backup directory is in a state the manager cannot reason about.
    /// Never retried; callers should stop.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// File watcher errors
    #[error("Watch error: {0}")]
    Watch(String),

    /// The background service is gone or refused a request
    #[error("Service error: {0}")]
    Service(String),
}

impl SaveWardenError {
    /// Create a "not found" error for a stored backup
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error must stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

impl From<std::io::Error> for SaveWardenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SaveWardenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<notify::Error> for SaveWardenError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}

/// Result type alias for SaveWarden operations
pub type SaveWardenResult<T> = Result<T, SaveWardenError>;
