use crate::domain::process::{FailedReason, Process, RollbackData, StateData};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of running a single state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    /// The step completed; record `rollback` and continue with the state named by `next`.
    Advance {
        next: StateData,
        rollback: RollbackData,
    },
    /// Waiting on something outside the engine (e.g. the customer paying).
    /// The process is left untouched until the next refresh.
    Pending,
    /// The step failed; the engine unwinds the ledger.
    Failed(FailedReason),
}

impl RunResult {
    /// Shorthand for `RunResult::Advance`.
    pub fn advance(next: StateData, rollback: RollbackData) -> Self {
        RunResult::Advance { next, rollback }
    }

    /// Shorthand for `RunResult::Failed`.
    pub fn failed(reason: FailedReason) -> Self {
        RunResult::Failed(reason)
    }
}

/// A single step of the place-order state machine.
///
/// `run` may be invoked again with the same data after a crash or a pending
/// result, so side effects must be idempotent or detectable. `rollback` must be
/// safe to retry.
#[async_trait]
pub trait State: Send + Sync {
    /// Stable identifier persisted as the process's current state name.
    fn name(&self) -> &'static str;

    fn is_final(&self) -> bool {
        false
    }

    async fn run(&self, process: &Process, data: &StateData) -> RunResult;

    async fn rollback(&self, data: &RollbackData) -> Result<()>;
}

pub type StateRef = Arc<dyn State>;
