//! Autosave retention policy
//!
//! An autosave is evicted only when *both* thresholds are exceeded: there are
//! more than `count_limit + 1` autosaves, and the oldest one is older than
//! `age_limit_ms` relative to the newest capture. The extra slot means the list
//! only shrinks back to `count_limit` once one more eligible entry has piled up.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::naming::age_cutoff_name;

/// Autosave retention thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Number of autosaves to keep regardless of age
    pub count_limit: u32,
    /// Age in milliseconds after which autosaves may be evicted
    pub age_limit_ms: u64,
}

impl RetentionPolicy {
    /// Create a new policy
    pub fn new(count_limit: u32, age_limit_ms: u64) -> Self {
        Self {
            count_limit,
            age_limit_ms,
        }
    }

    /// How many of the oldest `autosaves` (ascending) should be evicted after
    /// a capture at `latest`
    pub fn eviction_count<S: AsRef<str>>(
        &self,
        autosaves: &VecDeque<S>,
        latest: DateTime<Utc>,
    ) -> usize {
        let Some(cutoff) = age_cutoff_name(latest, self.age_limit_ms) else {
            return 0;
        };
        let keep_at_least = self.count_limit as usize + 1;

        autosaves
            .iter()
            .enumerate()
            .take_while(|&(evicted, name)| {
                let name: &str = name.as_ref();
                autosaves.len() - evicted > keep_at_least && name < cutoff.as_str()
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::naming::autosave_name;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn names(stamps: &[i64]) -> VecDeque<String> {
        stamps.iter().map(|&ms| autosave_name(ts(ms))).collect()
    }

    #[test]
    fn test_count_and_age_both_exceeded() {
        let policy = RetentionPolicy::new(2, 0);
        let list = names(&[1_000, 2_000, 3_000, 4_000, 5_000]);
        // 5 entries, must keep 3
        assert_eq!(policy.eviction_count(&list, ts(5_000)), 2);
    }

    #[test]
    fn test_headroom_of_one() {
        let policy = RetentionPolicy::new(2, 0);
        let list = names(&[1_000, 2_000, 3_000]);
        assert_eq!(policy.eviction_count(&list, ts(3_000)), 0);

        let list = names(&[1_000, 2_000, 3_000, 4_000]);
        assert_eq!(policy.eviction_count(&list, ts(4_000)), 1);
    }

    #[test]
    fn test_count_exceeded_but_young() {
        let policy = RetentionPolicy::new(1, 60_000);
        let list = names(&[1_000, 2_000, 3_000, 4_000, 5_000]);
        assert_eq!(policy.eviction_count(&list, ts(5_000)), 0);
    }

    #[test]
    fn test_old_but_count_not_exceeded() {
        let policy = RetentionPolicy::new(10, 0);
        let list = names(&[1_000, 2_000, 3_000]);
        assert_eq!(policy.eviction_count(&list, ts(100_000_000)), 0);
    }

    #[test]
    fn test_age_stops_eviction_midway() {
        let policy = RetentionPolicy::new(0, 2_500);
        let list = names(&[1_000, 2_000, 3_000, 4_000, 5_000]);
        // cutoff is 2_500: only 1_000 and 2_000 are old enough
        assert_eq!(policy.eviction_count(&list, ts(5_000)), 2);
    }

    #[test]
    fn test_huge_count_limit_never_evicts() {
        let policy = RetentionPolicy::new(u32::MAX, 0);
        let list = names(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(policy.eviction_count(&list, ts(1_000_000)), 0);
    }

    #[test]
    fn test_unrepresentable_age_never_evicts() {
        let policy = RetentionPolicy::new(0, u64::MAX);
        let list = names(&[1_000, 2_000, 3_000]);
        assert_eq!(policy.eviction_count(&list, ts(3_000)), 0);
    }
}
