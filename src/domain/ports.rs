use super::cart::{Cart, SessionId};
use super::payment::{
    PaymentFlowStatus, PaymentInfo, PaymentIntent, PaymentIntentId, PaymentRequest,
};
use super::process::{OrderId, Process};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Session-keyed storage of place-order processes.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    async fn load(&self, session: &SessionId) -> Result<Option<Process>>;
    async fn save(&self, session: &SessionId, process: &Process) -> Result<()>;
    async fn delete(&self, session: &SessionId) -> Result<()>;
}

#[async_trait]
pub trait CartProvider: Send + Sync {
    async fn get_cart(&self, session: &SessionId) -> Result<Cart>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name recorded on the payment confirmation.
    fn name(&self) -> &str;

    /// Registers a payment intent, returning the existing one when the
    /// request's reference was already used.
    async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent>;
    async fn query_status(&self, intent: &PaymentIntentId) -> Result<PaymentFlowStatus>;
    async fn void_intent(&self, intent: &PaymentIntentId) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn persist_order(&self, cart: &Cart, payment: &PaymentInfo) -> Result<OrderId>;
    /// Compensating action: marks a placed order as cancelled.
    async fn cancel_order(&self, order: &OrderId) -> Result<()>;
}

pub type ProcessStoreBox = Box<dyn ProcessStore>;
pub type CartProviderBox = Box<dyn CartProvider>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
