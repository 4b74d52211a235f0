//! Final states. The engine never runs them; they only mark the end of a process.

use crate::domain::process::{FAILED, Process, RollbackData, SUCCESS, StateData};
use crate::domain::state::{RunResult, State};
use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Default, Clone)]
pub struct Success;

#[derive(Debug, Default, Clone)]
pub struct Failed;

#[async_trait]
impl State for Success {
    fn name(&self) -> &'static str {
        SUCCESS
    }

    fn is_final(&self) -> bool {
        true
    }

    async fn run(&self, _process: &Process, _data: &StateData) -> RunResult {
        RunResult::Pending
    }

    async fn rollback(&self, _data: &RollbackData) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl State for Failed {
    fn name(&self) -> &'static str {
        FAILED
    }

    fn is_final(&self) -> bool {
        true
    }

    async fn run(&self, _process: &Process, _data: &StateData) -> RunResult {
        RunResult::Pending
    }

    async fn rollback(&self, _data: &RollbackData) -> Result<()> {
        Ok(())
    }
}
