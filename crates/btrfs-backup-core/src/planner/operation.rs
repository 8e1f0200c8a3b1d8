use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use super::retention::{evaluate_retention, RetentionPolicy};
use super::transfer::{plan_transfers, TransferOptions, TransferPlan};
use crate::error::{Error, Result};
use crate::snapshot::{SnapshotIdentity, SnapshotSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// What one invocation does for a backup pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Take a new read-only snapshot of the subvolume.
    Snapshot,
    /// Send missing snapshots to the target.
    Backup,
    /// Apply retention on both sides.
    Purge,
    /// Backup, then purge.
    Sync,
}

impl Operation {
    pub fn creates_snapshot(self) -> bool {
        self == Operation::Snapshot
    }

    pub fn transfers(self) -> bool {
        matches!(self, Operation::Backup | Operation::Sync)
    }

    pub fn purges(self) -> bool {
        matches!(self, Operation::Purge | Operation::Sync)
    }

    /// Whether the target location has to be scanned.
    pub fn reads_target(self) -> bool {
        self != Operation::Snapshot
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Snapshot => "snapshot",
            Operation::Backup => "backup",
            Operation::Purge => "purge",
            Operation::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// One step for the execution collaborator. Paths are absolute locations
/// of subvolumes; no command syntax is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateSnapshot {
        subvolume: PathBuf,
        snapshot: PathBuf,
    },
    Send {
        snapshot: PathBuf,
        parent: Option<PathBuf>,
        destination: PathBuf,
    },
    Delete {
        snapshot: PathBuf,
        side: Side,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateSnapshot {
                subvolume,
                snapshot,
            } => write!(
                f,
                "create snapshot {} of {}",
                snapshot.display(),
                subvolume.display()
            ),
            Action::Send {
                snapshot,
                parent: Some(parent),
                destination,
            } => write!(
                f,
                "send {} to {} (incremental from {})",
                snapshot.display(),
                destination.display(),
                parent.display()
            ),
            Action::Send {
                snapshot,
                parent: None,
                destination,
            } => write!(
                f,
                "send {} to {} (full)",
                snapshot.display(),
                destination.display()
            ),
            Action::Delete { snapshot, side } => {
                write!(f, "delete {} snapshot {}", side, snapshot.display())
            }
        }
    }
}

/// Non-fatal conditions found while planning. They travel with the plan so
/// the caller can show them before anything runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    UnparsableEntry { side: Side, name: String },
    /// No snapshot is shared with the target; the whole subvolume is sent.
    FullTransfer { snapshot: String },
    /// Past retention on `side` but needed as the parent of a pending send.
    RetentionConflict { side: Side, snapshot: String },
    BackfillSkipped { snapshot: String },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::UnparsableEntry { side, name } => {
                write!(f, "{} entry '{}' is not a snapshot, skipped", side, name)
            }
            PlanWarning::FullTransfer { snapshot } => write!(
                f,
                "no common parent for {}, it will be sent in full",
                snapshot
            ),
            PlanWarning::RetentionConflict { side, snapshot } => write!(
                f,
                "{} snapshot {} is past retention but kept as parent of a pending send",
                side, snapshot
            ),
            PlanWarning::BackfillSkipped { snapshot } => write!(
                f,
                "{} is older than the newest snapshot on the target, not sent",
                snapshot
            ),
        }
    }
}

/// Everything the planner needs to know about one backup pair.
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub pair: String,
    /// Subvolume that new snapshots are taken of.
    pub subvolume: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub source: SnapshotSet,
    pub target: SnapshotSet,
    /// Directory entries that were not snapshots.
    pub rejected: Vec<(Side, String)>,
    pub source_policy: RetentionPolicy,
    pub target_policy: RetentionPolicy,
}

/// Invocation-wide settings, passed in rather than read from the process.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub now: NaiveDateTime,
    pub suffix: Option<String>,
    pub backfill: bool,
}

impl PlanOptions {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now,
            suffix: None,
            backfill: false,
        }
    }
}

/// Ordered actions for one pair. Built once by [`build_plan`], then only
/// read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPlan {
    pair: String,
    operation: Operation,
    actions: Vec<Action>,
    warnings: Vec<PlanWarning>,
}

impl OperationPlan {
    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn full_transfers(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, PlanWarning::FullTransfer { .. }))
            .count()
    }
}

/// Compute the plan for one pair: create, then sends oldest first, then
/// source deletions, then target deletions.
///
/// Retention never removes a snapshot that a pending send uses as its
/// parent, on either side. Such snapshots are kept and reported as
/// [`PlanWarning::RetentionConflict`].
pub fn build_plan(
    operation: Operation,
    input: &PlanInput,
    options: &PlanOptions,
) -> Result<OperationPlan> {
    let mut actions = Vec::new();
    let mut warnings: Vec<PlanWarning> = input
        .rejected
        .iter()
        .map(|(side, name)| PlanWarning::UnparsableEntry {
            side: *side,
            name: name.clone(),
        })
        .collect();

    if operation.creates_snapshot() {
        let snapshot = SnapshotIdentity::new(options.now, options.suffix.as_deref())?;
        if input.source.get(snapshot.raw_name()).is_some() {
            return Err(Error::SnapshotExists(snapshot.raw_name().to_string()));
        }
        actions.push(Action::CreateSnapshot {
            subvolume: input.subvolume.clone(),
            snapshot: input.source_dir.join(snapshot.raw_name()),
        });
    }

    let transfers = if operation.transfers() {
        plan_transfers(
            &input.source,
            &input.target,
            TransferOptions {
                backfill: options.backfill,
            },
        )
    } else {
        TransferPlan::default()
    };

    for skipped in &transfers.skipped {
        warnings.push(PlanWarning::BackfillSkipped {
            snapshot: skipped.raw_name().to_string(),
        });
    }

    for entry in &transfers.entries {
        if entry.is_full() {
            warnings.push(PlanWarning::FullTransfer {
                snapshot: entry.snapshot.raw_name().to_string(),
            });
        }
        actions.push(Action::Send {
            snapshot: input.source_dir.join(entry.snapshot.raw_name()),
            parent: entry
                .parent
                .as_ref()
                .map(|parent| input.source_dir.join(parent.raw_name())),
            destination: input.target_dir.clone(),
        });
    }

    if operation.purges() {
        let parents = transfers.parents();
        let sides = [
            (Side::Source, &input.source, &input.source_policy, &input.source_dir),
            (Side::Target, &input.target, &input.target_policy, &input.target_dir),
        ];

        for (side, snapshots, policy, dir) in sides {
            let decision = evaluate_retention(snapshots, policy, options.now);
            debug!(
                "{} retention for '{}': keep {}, delete {}",
                side,
                input.pair,
                decision.keep.len(),
                decision.delete.len()
            );
            purge_actions(side, dir, decision.delete, &parents, &mut actions, &mut warnings);
        }
    }

    Ok(OperationPlan {
        pair: input.pair.clone(),
        operation,
        actions,
        warnings,
    })
}

fn purge_actions(
    side: Side,
    dir: &Path,
    doomed: Vec<SnapshotIdentity>,
    parents: &[&SnapshotIdentity],
    actions: &mut Vec<Action>,
    warnings: &mut Vec<PlanWarning>,
) {
    for snapshot in doomed {
        if parents.iter().any(|parent| parent.same_snapshot(&snapshot)) {
            warnings.push(PlanWarning::RetentionConflict {
                side,
                snapshot: snapshot.raw_name().to_string(),
            });
            continue;
        }
        actions.push(Action::Delete {
            snapshot: dir.join(snapshot.raw_name()),
            side,
        });
    }
}
