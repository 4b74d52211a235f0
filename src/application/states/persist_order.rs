use crate::domain::ports::OrderStoreRef;
use crate::domain::process::{
    FailedReason, PERSIST_ORDER, PlaceOrderInfo, PlacedOrderInfo, Process, RollbackData,
    StateData,
};
use crate::domain::state::{RunResult, State};
use crate::error::Result;
use async_trait::async_trait;

/// Writes the order to the order store once the payment is confirmed.
pub struct PersistOrder {
    orders: OrderStoreRef,
}

impl PersistOrder {
    /// Creates the state on top of the store orders are written to.
    pub fn new(orders: OrderStoreRef) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl State for PersistOrder {
    fn name(&self) -> &'static str {
        PERSIST_ORDER
    }

    async fn run(&self, process: &Process, data: &StateData) -> RunResult {
        let StateData::PersistOrder { payment } = data else {
            return RunResult::failed(FailedReason::Error {
                message: format!("unexpected state data for {}", self.name()),
            });
        };
        let cart = process.cart();

        match self.orders.persist_order(cart, payment).await {
            Ok(order_id) => {
                tracing::info!(order = %order_id, process = %process.uuid(), "order persisted");
                let info = PlaceOrderInfo {
                    payment_infos: vec![payment.clone()],
                    placed_order_infos: vec![PlacedOrderInfo {
                        order_id: order_id.clone(),
                        cart_id: cart.id.clone(),
                    }],
                    contact_email: cart.contact_email.clone().unwrap_or_default(),
                };
                RunResult::advance(
                    StateData::Success(info),
                    RollbackData::CancelOrder { order_id },
                )
            }
            Err(e) => RunResult::failed(FailedReason::PlaceOrderFailed {
                message: e.to_string(),
            }),
        }
    }

    async fn rollback(&self, data: &RollbackData) -> Result<()> {
        if let RollbackData::CancelOrder { order_id } = data {
            self.orders.cancel_order(order_id).await?;
            tracing::info!(order = %order_id, "order cancelled");
        }
        Ok(())
    }
}
