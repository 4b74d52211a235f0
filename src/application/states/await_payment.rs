use crate::domain::payment::{PaymentDecision, PaymentDecisionFn, PaymentInfo};
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::process::{
    AWAIT_PAYMENT_CONFIRMATION, FailedReason, Process, RollbackData, StateData,
};
use crate::domain::state::{RunResult, State};
use crate::error::Result;
use async_trait::async_trait;

/// Waits until the gateway reports the payment as confirmed.
///
/// While pending, the state data carries the action the customer has to take
/// (redirect, iframe, ...). Each refresh re-queries the gateway and asks the
/// injected decision function what to do with the reported status.
pub struct AwaitPaymentConfirmation {
    gateway: PaymentGatewayRef,
    decide: PaymentDecisionFn,
}

impl AwaitPaymentConfirmation {
    /// Creates the state.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The gateway the payment status is queried from.
    /// * `decide` - The strategy turning the reported status into a decision.
    pub fn new(gateway: PaymentGatewayRef, decide: PaymentDecisionFn) -> Self {
        Self { gateway, decide }
    }
}

#[async_trait]
impl State for AwaitPaymentConfirmation {
    fn name(&self) -> &'static str {
        AWAIT_PAYMENT_CONFIRMATION
    }

    async fn run(&self, process: &Process, data: &StateData) -> RunResult {
        let StateData::AwaitPaymentConfirmation { intent_id, .. } = data else {
            return RunResult::failed(FailedReason::Error {
                message: format!("unexpected state data for {}", self.name()),
            });
        };

        let flow = match self.gateway.query_status(intent_id).await {
            Ok(flow) => flow,
            Err(e) => {
                return RunResult::failed(FailedReason::PaymentError {
                    message: e.to_string(),
                });
            }
        };

        match (self.decide)(&flow) {
            PaymentDecision::Confirmed => {
                let cart = process.cart();
                let amount = match cart.grand_total() {
                    Ok(amount) => amount,
                    Err(e) => return RunResult::failed(FailedReason::cart_validation(e)),
                };
                RunResult::advance(
                    StateData::PersistOrder {
                        payment: PaymentInfo {
                            gateway: self.gateway.name().to_string(),
                            intent_id: intent_id.clone(),
                            amount,
                            currency: cart.currency.clone(),
                            status: flow.status,
                        },
                    },
                    RollbackData::Nothing,
                )
            }
            PaymentDecision::Pending => {
                tracing::debug!(
                    intent = %intent_id,
                    status = ?flow.status,
                    "payment still pending"
                );
                RunResult::Pending
            }
            PaymentDecision::Declined(reason) => RunResult::failed(reason),
        }
    }

    async fn rollback(&self, _data: &RollbackData) -> Result<()> {
        // the intent itself is voided by CreatePayment's ledger entry
        Ok(())
    }
}
