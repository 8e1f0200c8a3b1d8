use crate::planner::{Action, OperationPlan};

/// Trait for reporting plan execution.
///
/// The CLI implements it with an indicatif spinner. All methods have
/// default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_plan_start(&self, _plan: &OperationPlan) {}
    fn on_action_start(&self, _index: usize, _total: usize, _action: &Action) {}
    fn on_action_complete(&self, _index: usize, _action: &Action, _duration_secs: f64) {}
    fn on_action_failed(&self, _index: usize, _action: &Action, _error: &crate::Error) {}
    fn on_plan_complete(&self, _plan: &OperationPlan, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
