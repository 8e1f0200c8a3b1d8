use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BackupPair};
use crate::error::Result;
use crate::executor::{execute_plan, Executor};
use crate::planner::{build_plan, Operation, OperationPlan, PlanInput, PlanOptions, Side};
use crate::progress::ProgressReporter;
use crate::scanner::{self, DirectoryLister, FsLister, ScanOutcome};
use crate::snapshot::{SnapshotIdentity, SnapshotSet};

/// Scans, plans and executes operations for the configured backup pairs.
pub struct BackupEngine<L = FsLister> {
    config: AppConfig,
    lister: L,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub pairs: usize,
    pub actions: usize,
    pub full_transfers: usize,
    pub warnings: usize,
    pub duration: Duration,
}

/// Where a snapshot currently exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Both,
    SourceOnly,
    TargetOnly,
}

#[derive(Debug, Clone)]
pub struct PairListing {
    pub pair: String,
    pub source: ScanOutcome,
    pub target: ScanOutcome,
}

impl PairListing {
    /// Every snapshot from either side, oldest first. Snapshots found on
    /// both sides appear once, under their source name.
    pub fn entries(&self) -> Vec<(&SnapshotIdentity, Presence)> {
        let source = &self.source.snapshots;
        let target = &self.target.snapshots;

        let mut entries: Vec<(&SnapshotIdentity, Presence)> = source
            .iter()
            .map(|s| {
                let presence = if target.contains(s) {
                    Presence::Both
                } else {
                    Presence::SourceOnly
                };
                (s, presence)
            })
            .chain(
                target
                    .iter()
                    .filter(|t| !source.contains(t))
                    .map(|t| (t, Presence::TargetOnly)),
            )
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl BackupEngine<FsLister> {
    pub fn new(config: AppConfig) -> Self {
        Self::with_lister(config, FsLister)
    }
}

impl<L: DirectoryLister> BackupEngine<L> {
    pub fn with_lister(config: AppConfig, lister: L) -> Self {
        Self { config, lister }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Planning options for an invocation at `now`, with the configured
    /// global defaults applied.
    pub fn plan_options(&self, now: NaiveDateTime, suffix: Option<String>) -> PlanOptions {
        PlanOptions {
            now,
            suffix,
            backfill: self.config.global.backfill,
        }
    }

    fn scan(&self, pair: &BackupPair, side: Side) -> Result<ScanOutcome> {
        let location = match side {
            Side::Source => &pair.source,
            Side::Target => &pair.target,
        };
        scanner::scan(&self.lister, location)
    }

    pub fn plan_pair(
        &self,
        pair: &BackupPair,
        operation: Operation,
        options: &PlanOptions,
    ) -> Result<OperationPlan> {
        info!("Processing {} for pair '{}'", operation, pair.name);
        debug!(
            "Source: {} -> Target: {}",
            pair.source.display(),
            pair.target.display()
        );

        let source = self.scan(pair, Side::Source)?;
        let target = if operation.reads_target() {
            Some(self.scan(pair, Side::Target)?)
        } else {
            None
        };

        if operation.transfers() && source.snapshots.is_empty() {
            info!("No snapshots found in source: {}", pair.source.display());
        }
        if operation.purges() {
            info!(
                "Retention policy: {} days, {} snapshots (target: {} days, {} snapshots)",
                pair.retention_days,
                pair.retention_count,
                pair.target_retention_days,
                pair.target_retention_count
            );
        }

        let mut rejected: Vec<(Side, String)> = source
            .rejected
            .into_iter()
            .map(|entry| (Side::Source, entry.0))
            .collect();
        let target_snapshots = match target {
            Some(target) => {
                rejected.extend(target.rejected.into_iter().map(|entry| (Side::Target, entry.0)));
                target.snapshots
            }
            None => SnapshotSet::default(),
        };

        let input = PlanInput {
            pair: pair.name.clone(),
            subvolume: pair.subvolume().to_path_buf(),
            source_dir: pair.source.clone(),
            target_dir: pair.target.clone(),
            source: source.snapshots,
            target: target_snapshots,
            rejected,
            source_policy: pair.source_policy(),
            target_policy: pair.target_policy(),
        };

        let plan = build_plan(operation, &input, options)?;
        for warning in plan.warnings() {
            warn!("Pair '{}': {}", pair.name, warning);
        }
        if plan.is_empty() {
            match operation {
                Operation::Backup | Operation::Sync => {
                    info!("Backup is up to date for pair '{}'", pair.name)
                }
                _ => info!("Nothing to do for pair '{}'", pair.name),
            }
        }
        Ok(plan)
    }

    /// Plans for the selected pairs without executing anything.
    pub fn plan(
        &self,
        selection: Option<&str>,
        operation: Operation,
        options: &PlanOptions,
    ) -> Result<Vec<OperationPlan>> {
        self.config
            .select_pairs(selection)?
            .into_iter()
            .map(|pair| self.plan_pair(pair, operation, options))
            .collect()
    }

    /// Plan and execute pair by pair, in configuration order. The first
    /// failure ends the whole run.
    pub fn run<E, R>(
        &self,
        selection: Option<&str>,
        operation: Operation,
        options: &PlanOptions,
        executor: &E,
        reporter: &R,
    ) -> Result<RunSummary>
    where
        E: Executor + ?Sized,
        R: ProgressReporter + ?Sized,
    {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        for pair in self.config.select_pairs(selection)? {
            let plan = self.plan_pair(pair, operation, options)?;
            let report = execute_plan(&plan, executor, reporter)?;

            summary.pairs += 1;
            summary.actions += report.executed;
            summary.full_transfers += plan.full_transfers();
            summary.warnings += plan.warnings().len();
        }

        summary.duration = started.elapsed();
        Ok(summary)
    }

    pub fn list_pair(&self, pair: &BackupPair) -> Result<PairListing> {
        Ok(PairListing {
            pair: pair.name.clone(),
            source: self.scan(pair, Side::Source)?,
            target: self.scan(pair, Side::Target)?,
        })
    }
}
