use crate::domain::payment::PaymentRequest;
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::process::{CREATE_PAYMENT, FailedReason, Process, RollbackData, StateData};
use crate::domain::state::{RunResult, State};
use crate::error::Result;
use async_trait::async_trait;

/// Registers a payment intent for the cart's grand total.
///
/// The process UUID is sent as the gateway reference, so running this state a
/// second time picks up the intent created by the first run.
pub struct CreatePayment {
    gateway: PaymentGatewayRef,
}

impl CreatePayment {
    /// Creates the state on top of the gateway intents are registered with.
    pub fn new(gateway: PaymentGatewayRef) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl State for CreatePayment {
    fn name(&self) -> &'static str {
        CREATE_PAYMENT
    }

    async fn run(&self, process: &Process, _data: &StateData) -> RunResult {
        let cart = process.cart();
        let amount = match cart.grand_total() {
            Ok(amount) => amount,
            Err(e) => return RunResult::failed(FailedReason::cart_validation(e)),
        };
        let request = PaymentRequest {
            reference: process.uuid().to_string(),
            amount,
            currency: cart.currency.clone(),
            return_url: process.return_url().to_string(),
        };

        match self.gateway.create_intent(request).await {
            Ok(intent) => {
                tracing::debug!(
                    intent = %intent.id,
                    gateway = self.gateway.name(),
                    "payment intent created"
                );
                RunResult::advance(
                    StateData::AwaitPaymentConfirmation {
                        intent_id: intent.id.clone(),
                        action: intent.action,
                    },
                    RollbackData::VoidPayment {
                        intent_id: intent.id,
                    },
                )
            }
            Err(e) => RunResult::failed(FailedReason::PaymentError {
                message: e.to_string(),
            }),
        }
    }

    async fn rollback(&self, data: &RollbackData) -> Result<()> {
        if let RollbackData::VoidPayment { intent_id } = data {
            self.gateway.void_intent(intent_id).await?;
            tracing::info!(intent = %intent_id, "payment intent voided");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{Cart, CartItem};
    use crate::infrastructure::in_memory::InMemoryPaymentGateway;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_overflowing_total_fails_before_gateway_call() {
        let gateway = InMemoryPaymentGateway::new();
        let state = CreatePayment::new(Arc::new(gateway.clone()));
        let cart = Cart::new("cart-1", "EUR")
            .with_item(CartItem::new("sku-1", 2, Decimal::MAX))
            .with_contact_email("jane@example.com");
        let process = Process::new(cart, "https://shop.example/return".to_string());

        let result = state.run(&process, &StateData::CreatePayment).await;

        assert_eq!(
            result,
            RunResult::failed(FailedReason::CartValidation {
                message: "grand total overflows".to_string()
            })
        );
        assert_eq!(gateway.intent_count(), 0);
    }
}
