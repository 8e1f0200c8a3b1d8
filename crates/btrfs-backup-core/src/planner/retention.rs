//! Age-or-count retention.
//!
//! A snapshot is kept if it is among the `min_count` newest, or if it is
//! younger than `min_age_days`. Only snapshots failing both rules are
//! deleted. A zero in either field disables that rule alone.

use chrono::{Duration, NaiveDateTime};

use crate::snapshot::{SnapshotIdentity, SnapshotSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub min_age_days: u32,
    pub min_count: usize,
}

impl RetentionPolicy {
    pub fn new(min_age_days: u32, min_count: usize) -> Self {
        Self {
            min_age_days,
            min_count,
        }
    }

    fn is_young(&self, snapshot: &SnapshotIdentity, now: NaiveDateTime) -> bool {
        now - snapshot.timestamp() < Duration::days(i64::from(self.min_age_days))
    }
}

/// Why a snapshot survives retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    /// One of the `min_count` newest.
    Recent,
    /// Younger than `min_age_days`.
    Young,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionDecision {
    /// Newest first.
    pub keep: Vec<(SnapshotIdentity, KeepReason)>,
    /// Oldest first, the order deletions should run in.
    pub delete: Vec<SnapshotIdentity>,
}

pub fn evaluate_retention(
    snapshots: &SnapshotSet,
    policy: &RetentionPolicy,
    now: NaiveDateTime,
) -> RetentionDecision {
    let mut decision = RetentionDecision::default();

    for (rank, snapshot) in snapshots.iter().rev().enumerate() {
        if rank < policy.min_count {
            decision.keep.push((snapshot.clone(), KeepReason::Recent));
        } else if policy.is_young(snapshot, now) {
            decision.keep.push((snapshot.clone(), KeepReason::Young));
        } else {
            decision.delete.push(snapshot.clone());
        }
    }

    decision.delete.reverse();
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn days_ago(days: i64) -> SnapshotIdentity {
        SnapshotIdentity::new(now() - Duration::days(days), None).unwrap()
    }

    fn spanning_90_days() -> SnapshotSet {
        SnapshotSet::new([days_ago(90), days_ago(60), days_ago(40), days_ago(20), days_ago(1)])
    }

    #[test]
    fn test_count_then_age() {
        let decision = evaluate_retention(&spanning_90_days(), &RetentionPolicy::new(30, 2), now());

        let kept: Vec<_> = decision.keep.iter().map(|(s, r)| (s.clone(), *r)).collect();
        assert_eq!(
            kept,
            vec![(days_ago(1), KeepReason::Recent), (days_ago(20), KeepReason::Recent)]
        );
        assert_eq!(decision.delete, vec![days_ago(90), days_ago(60), days_ago(40)]);
    }

    #[test]
    fn test_age_keeps_beyond_count() {
        let decision = evaluate_retention(&spanning_90_days(), &RetentionPolicy::new(45, 1), now());
        assert_eq!(decision.keep.len(), 3);
        assert_eq!(decision.keep[1], (days_ago(20), KeepReason::Young));
        assert_eq!(decision.keep[2], (days_ago(40), KeepReason::Young));
        assert_eq!(decision.delete, vec![days_ago(90), days_ago(60)]);
    }

    #[test]
    fn test_zero_count_still_honours_age() {
        let decision = evaluate_retention(&spanning_90_days(), &RetentionPolicy::new(30, 0), now());
        assert_eq!(decision.keep.len(), 2);
        assert!(decision.keep.iter().all(|(_, r)| *r == KeepReason::Young));
    }

    #[test]
    fn test_zero_age_still_honours_count() {
        let decision = evaluate_retention(&spanning_90_days(), &RetentionPolicy::new(0, 3), now());
        assert_eq!(decision.keep.len(), 3);
        assert_eq!(decision.delete.len(), 2);
    }

    #[test]
    fn test_both_disabled_deletes_everything_past() {
        let decision = evaluate_retention(&spanning_90_days(), &RetentionPolicy::default(), now());
        assert!(decision.keep.is_empty());
        assert_eq!(decision.delete.len(), 5);
    }

    #[test]
    fn test_future_snapshot_is_kept() {
        let set = SnapshotSet::new([days_ago(-2)]);
        let decision = evaluate_retention(&set, &RetentionPolicy::new(1, 0), now());
        assert!(decision.delete.is_empty());
    }

    #[test]
    fn test_never_deletes_protected_entries() {
        let set = spanning_90_days();
        for days in [0, 1, 30, 61, 100] {
            for count in [0, 1, 2, 5, 9] {
                let policy = RetentionPolicy::new(days, count);
                let decision = evaluate_retention(&set, &policy, now());
                let newest: Vec<_> = set.iter().rev().take(count).collect();
                for doomed in &decision.delete {
                    assert!(!newest.contains(&doomed));
                    assert!(now() - doomed.timestamp() >= Duration::days(i64::from(days)));
                }
                assert_eq!(decision.keep.len() + decision.delete.len(), set.len());
            }
        }
    }

    #[test]
    fn test_boundary_age_is_deleted() {
        let set = SnapshotSet::new([days_ago(30)]);
        let decision = evaluate_retention(&set, &RetentionPolicy::new(30, 0), now());
        assert_eq!(decision.delete, vec![days_ago(30)]);
    }
}
