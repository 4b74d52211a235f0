use crate::domain::process::{FailedReason, Process, RollbackData, StateData, VALIDATE_CART};
use crate::domain::state::{RunResult, State};
use crate::error::Result;
use async_trait::async_trait;

/// Re-checks the cart snapshot before any payment is created.
#[derive(Debug, Default, Clone)]
pub struct ValidateCart;

#[async_trait]
impl State for ValidateCart {
    fn name(&self) -> &'static str {
        VALIDATE_CART
    }

    async fn run(&self, process: &Process, _data: &StateData) -> RunResult {
        match process.cart().validate() {
            Ok(()) => RunResult::advance(StateData::CreatePayment, RollbackData::Nothing),
            Err(e) => RunResult::failed(FailedReason::cart_validation(e)),
        }
    }

    async fn rollback(&self, _data: &RollbackData) -> Result<()> {
        Ok(())
    }
}
