//! Planning: which snapshots to send, with which parent, and which to
//! delete. Pure functions over snapshot sets; nothing here touches disk.

pub mod operation;
pub mod retention;
pub mod transfer;

pub use operation::{
    build_plan, Action, Operation, OperationPlan, PlanInput, PlanOptions, PlanWarning, Side,
};
pub use retention::{evaluate_retention, KeepReason, RetentionDecision, RetentionPolicy};
pub use transfer::{plan_transfers, TransferOptions, TransferPlan, TransferPlanEntry};
