//! Backup display formatting
//!
//! Formats backup lists and service events for terminal output. Both lists
//! are shown newest first.

use chrono::{DateTime, Utc};

use crate::backup::naming::{manual_label, parse_autosave_name, parse_manual_id};
use crate::backup::{BackupDirectoryState, BackupEvent};

/// Format both backup lists as two tables
pub fn format_backup_list(
    state: &BackupDirectoryState,
    limit: Option<usize>,
    now: DateTime<Utc>,
) -> String {
    let limit = limit.unwrap_or(usize::MAX);
    let mut output = String::new();

    output.push_str(&format!("Autosaves ({})\n", state.autosaves.len()));
    if state.autosaves.is_empty() {
        output.push_str("  (none)\n");
    }
    for name in state.autosaves.iter().rev().take(limit) {
        let age = parse_autosave_name(name)
            .map(|captured| format!("{} ago", format_duration(now.signed_duration_since(captured))))
            .unwrap_or_default();
        output.push_str(&format!("  {:<30}  {:>10}\n", name, age));
    }

    output.push('\n');
    output.push_str(&format!("Manual saves ({})\n", state.manual_saves.len()));
    if state.manual_saves.is_empty() {
        output.push_str("  (none)\n");
    }
    for name in state.manual_saves.iter().rev().take(limit) {
        let id = parse_manual_id(name).unwrap_or_default();
        let label = manual_label(name).unwrap_or(name);
        output.push_str(&format!("  #{:<5} {:<24}  {}\n", id, label, name));
    }

    output
}

/// One-line description of a service event
pub fn format_event(event: &BackupEvent) -> String {
    match event {
        BackupEvent::Autosaved { name, evicted: 0 } => format!("autosaved {}", name),
        BackupEvent::Autosaved { name, evicted } => {
            format!("autosaved {} (evicted {} old autosave(s))", name, evicted)
        }
        BackupEvent::ManualSaveCreated { name } => format!("created manual save {}", name),
    }
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    format!("{}d", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::naming::autosave_name;
    use chrono::{TimeDelta, TimeZone};

    fn state() -> (BackupDirectoryState, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let state = BackupDirectoryState {
            autosaves: [
                now - TimeDelta::hours(3),
                now - TimeDelta::minutes(5),
                now - TimeDelta::seconds(10),
            ]
            .into_iter()
            .map(autosave_name)
            .collect(),
            manual_saves: vec!["m0000_start".into(), "m0003_boss fight".into()],
            next_manual_id: 4,
        };
        (state, now)
    }

    #[test]
    fn test_list_is_newest_first() {
        let (state, now) = state();
        let output = format_backup_list(&state, None, now);

        let newest = output.find(&autosave_name(now - TimeDelta::seconds(10))).unwrap();
        let oldest = output.find(&autosave_name(now - TimeDelta::hours(3))).unwrap();
        assert!(newest < oldest);
        assert!(output.contains("10s ago"));
        assert!(output.contains("3h ago"));

        let boss = output.find("boss fight").unwrap();
        let start = output.find("m0000_start").unwrap();
        assert!(boss < start);
    }

    #[test]
    fn test_list_limit() {
        let (state, now) = state();
        let output = format_backup_list(&state, Some(1), now);

        assert!(output.contains("Autosaves (3)"));
        assert!(!output.contains("3h ago"));
        assert!(!output.contains("m0000_start"));
    }

    #[test]
    fn test_empty_list() {
        let output = format_backup_list(&BackupDirectoryState::default(), None, Utc::now());
        assert_eq!(output.matches("(none)").count(), 2);
    }

    #[test]
    fn test_format_event() {
        let plain = BackupEvent::Autosaved {
            name: "auto_x".into(),
            evicted: 0,
        };
        assert_eq!(format_event(&plain), "autosaved auto_x");

        let evicting = BackupEvent::Autosaved {
            name: "auto_x".into(),
            evicted: 2,
        };
        assert!(format_event(&evicting).contains("evicted 2"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(5)), "5s");
        assert_eq!(format_duration(TimeDelta::seconds(125)), "2m");
        assert_eq!(format_duration(TimeDelta::hours(5)), "5h");
        assert_eq!(format_duration(TimeDelta::days(3)), "3d");
        assert_eq!(format_duration(TimeDelta::seconds(-4)), "0s");
    }
}
