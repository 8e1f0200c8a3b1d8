//! Incremental transfer ordering.
//!
//! Every source snapshot missing at the target is sent oldest first. Each
//! one uses the nearest strictly earlier snapshot that is present on both
//! sides as its parent, counting snapshots sent earlier in the same plan.

use tracing::debug;

use crate::snapshot::{SnapshotIdentity, SnapshotSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Also send source snapshots older than the newest snapshot both
    /// sides already share. Off by default: those are normally gaps left
    /// by target-side retention.
    pub backfill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlanEntry {
    /// Source-side snapshot to send.
    pub snapshot: SnapshotIdentity,
    /// Source-side spelling of the incremental base. `None` means a full
    /// send.
    pub parent: Option<SnapshotIdentity>,
}

impl TransferPlanEntry {
    pub fn is_full(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferPlan {
    pub entries: Vec<TransferPlanEntry>,
    /// Missing snapshots left out because they predate the newest common
    /// snapshot and backfill is off.
    pub skipped: Vec<SnapshotIdentity>,
}

impl TransferPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn full_transfers(&self) -> impl Iterator<Item = &TransferPlanEntry> {
        self.entries.iter().filter(|e| e.is_full())
    }

    /// Parents referenced by pending sends, deduplicated.
    pub fn parents(&self) -> Vec<&SnapshotIdentity> {
        let mut parents: Vec<&SnapshotIdentity> =
            self.entries.iter().filter_map(|e| e.parent.as_ref()).collect();
        parents.sort();
        parents.dedup();
        parents
    }
}

pub fn plan_transfers(
    source: &SnapshotSet,
    target: &SnapshotSet,
    options: TransferOptions,
) -> TransferPlan {
    let at_target = target.keys();
    let newest_common = source
        .iter()
        .filter(|s| at_target.contains(&s.key()))
        .map(SnapshotIdentity::timestamp)
        .max();

    let mut plan = TransferPlan::default();
    // Snapshots that exist on both sides once earlier entries have run.
    let mut bases: Vec<&SnapshotIdentity> = Vec::new();

    for snapshot in source {
        if at_target.contains(&snapshot.key()) {
            bases.push(snapshot);
            continue;
        }

        if !options.backfill && newest_common.is_some_and(|ts| snapshot.timestamp() < ts) {
            debug!("Not backfilling {} behind the newest common snapshot", snapshot);
            plan.skipped.push(snapshot.clone());
            continue;
        }

        // Strictly earlier: a snapshot sharing this timestamp is never its
        // parent, so a same-instant tie is sent in full.
        let parent = bases
            .iter()
            .rev()
            .find(|base| base.timestamp() < snapshot.timestamp())
            .map(|base| (*base).clone());

        plan.entries.push(TransferPlanEntry {
            snapshot: snapshot.clone(),
            parent,
        });
        bases.push(snapshot);
    }

    plan
}
