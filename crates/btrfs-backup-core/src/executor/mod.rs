//! Execution collaborator: turns planned actions into btrfs invocations, or
//! only describes them in dry-run mode.

pub mod btrfs;

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::planner::{Action, OperationPlan};
use crate::progress::ProgressReporter;

pub use btrfs::{command_line, BtrfsExecutor, DryRunExecutor};

pub trait Executor {
    fn execute(&self, action: &Action) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub executed: usize,
    pub duration: Duration,
}

/// Run every action of `plan` in order.
///
/// Stops at the first failure: later sends may name earlier ones as their
/// parent, so nothing after a failed step is attempted.
pub fn execute_plan<E, R>(plan: &OperationPlan, executor: &E, reporter: &R) -> Result<ExecutionReport>
where
    E: Executor + ?Sized,
    R: ProgressReporter + ?Sized,
{
    let started = Instant::now();
    let total = plan.len();
    reporter.on_plan_start(plan);

    for (index, action) in plan.actions().iter().enumerate() {
        reporter.on_action_start(index, total, action);
        let action_started = Instant::now();

        if let Err(err) = executor.execute(action) {
            error!("Failed to {}: {}", action, err);
            reporter.on_action_failed(index, action, &err);
            let remaining = total - index - 1;
            if remaining > 0 {
                warn!(
                    "Skipping {} remaining action(s) for pair '{}'",
                    remaining,
                    plan.pair()
                );
            }
            return Err(Error::ActionFailed {
                step: index + 1,
                action: action.to_string(),
                source: Box::new(err),
            });
        }

        let elapsed = action_started.elapsed();
        debug!("Done in {:.2}s: {}", elapsed.as_secs_f64(), action);
        reporter.on_action_complete(index, action, elapsed.as_secs_f64());
    }

    let duration = started.elapsed();
    reporter.on_plan_complete(plan, duration.as_secs_f64());
    info!(
        "{} for pair '{}': {} action(s) in {:.2}s",
        plan.operation(),
        plan.pair(),
        total,
        duration.as_secs_f64()
    );

    Ok(ExecutionReport {
        executed: total,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    use crate::planner::{build_plan, Operation, PlanInput, PlanOptions, RetentionPolicy};
    use crate::progress::SilentReporter;
    use crate::snapshot::SnapshotSet;
    use chrono::NaiveDate;

    struct Recording {
        fail_at: Option<usize>,
        seen: RefCell<Vec<Action>>,
    }

    impl Executor for Recording {
        fn execute(&self, action: &Action) -> Result<()> {
            let mut seen = self.seen.borrow_mut();
            seen.push(action.clone());
            if Some(seen.len()) == self.fail_at {
                return Err(Error::CommandFailed {
                    command: command_line(action),
                    status: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }
    }

    fn three_sends() -> OperationPlan {
        let (source, _) = SnapshotSet::from_names([
            "2025-01-01T00:00:00",
            "2025-01-08T00:00:00",
            "2025-01-15T00:00:00",
        ]);
        let input = PlanInput {
            pair: "root".to_string(),
            subvolume: PathBuf::from("/src"),
            source_dir: PathBuf::from("/src"),
            target_dir: PathBuf::from("/dst"),
            source,
            target: SnapshotSet::default(),
            rejected: Vec::new(),
            source_policy: RetentionPolicy::new(30, 10),
            target_policy: RetentionPolicy::new(90, 20),
        };
        let now = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        build_plan(Operation::Backup, &input, &PlanOptions::at(now)).unwrap()
    }

    #[test]
    fn test_runs_every_action_in_order() {
        let plan = three_sends();
        let executor = Recording {
            fail_at: None,
            seen: RefCell::new(Vec::new()),
        };

        let report = execute_plan(&plan, &executor, &SilentReporter).unwrap();
        assert_eq!(report.executed, 3);
        assert_eq!(executor.seen.borrow().as_slice(), plan.actions());
    }

    #[test]
    fn test_halts_on_first_failure() {
        let plan = three_sends();
        let executor = Recording {
            fail_at: Some(2),
            seen: RefCell::new(Vec::new()),
        };

        let err = execute_plan(&plan, &executor, &SilentReporter).unwrap_err();
        assert!(matches!(err, Error::ActionFailed { step: 2, .. }));
        assert_eq!(executor.seen.borrow().len(), 2);
    }

    #[test]
    fn test_empty_plan() {
        let plan = build_plan(
            Operation::Purge,
            &PlanInput {
                pair: "empty".to_string(),
                subvolume: PathBuf::from("/src"),
                source_dir: PathBuf::from("/src"),
                target_dir: PathBuf::from("/dst"),
                source: SnapshotSet::default(),
                target: SnapshotSet::default(),
                rejected: Vec::new(),
                source_policy: RetentionPolicy::default(),
                target_policy: RetentionPolicy::default(),
            },
            &PlanOptions::at(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()),
        )
        .unwrap();

        let executor = Recording {
            fail_at: Some(1),
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(execute_plan(&plan, &executor, &SilentReporter).unwrap().executed, 0);
    }
}
