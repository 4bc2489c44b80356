//! File naming inside the backup directory
//!
//! The backup directory is flat:
//!
//! - `_temp` is the staging file used mid-capture
//! - `auto_YYYY-MM-DD_HH-MM-SS_mmm` holds one autosave; the timestamp is the
//!   source file's modification time in UTC, so string order is chronological
//! - `mNNNN_<label>` holds one manual save with a zero-padded sequence id

use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::{SaveWardenError, SaveWardenResult};

/// Name of the staging file
pub const STAGING_NAME: &str = "_temp";

/// Prefix shared by all autosave names
pub const AUTOSAVE_PREFIX: &str = "auto_";

/// Prefix shared by all manual-save names
pub const MANUAL_PREFIX: &str = "m";

const AUTOSAVE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S_%3f";

/// Autosave name for a modification time, truncated to milliseconds
pub fn autosave_name(timestamp: DateTime<Utc>) -> String {
    format!("{}{}", AUTOSAVE_PREFIX, timestamp.format(AUTOSAVE_TIME_FORMAT))
}

/// Autosave name for a filesystem modification time
pub fn autosave_name_for(modified: SystemTime) -> String {
    autosave_name(DateTime::<Utc>::from(modified))
}

/// Recover the timestamp encoded in an autosave name
pub fn parse_autosave_name(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix(AUTOSAVE_PREFIX)?;
    NaiveDateTime::parse_from_str(stamp, AUTOSAVE_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Check if a directory entry is an autosave
pub fn is_autosave_name(name: &str) -> bool {
    parse_autosave_name(name).is_some()
}

/// Name below which autosaves count as "too old"
///
/// Returns `None` when the age limit reaches past the representable range, in
/// which case no autosave is old enough to evict.
pub fn age_cutoff_name(latest: DateTime<Utc>, age_limit_ms: u64) -> Option<String> {
    let age = i64::try_from(age_limit_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)?;
    latest.checked_sub_signed(age).map(autosave_name)
}

/// Manual-save name for a sequence id and user label
pub fn manual_name(id: u32, label: &str) -> String {
    format!("{}{:04}_{}", MANUAL_PREFIX, id, label)
}

/// Parse the sequence id out of a manual-save name
///
/// Accepts `m` followed by at least four digits and an underscore.
pub fn parse_manual_id(name: &str) -> Option<u32> {
    let rest = name.strip_prefix(MANUAL_PREFIX)?;
    let (digits, _label) = rest.split_once('_')?;
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Label part of a manual-save name
pub fn manual_label(name: &str) -> Option<&str> {
    parse_manual_id(name)?;
    name.split_once('_').map(|(_, label)| label)
}

/// Check that a user label can be embedded in a file name
pub fn validate_label(label: &str) -> SaveWardenResult<()> {
    if label.trim().is_empty() {
        return Err(SaveWardenError::Validation("Save label cannot be empty".into()));
    }
    if label
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control())
    {
        return Err(SaveWardenError::Validation(format!(
            "Save label contains characters not allowed in file names: {:?}",
            label
        )));
    }
    Ok(())
}
