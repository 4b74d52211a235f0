#![allow(dead_code)]

use async_trait::async_trait;
use placeorder::application::handler::{PlaceOrderHandler, StartPlaceOrderCommand};
use placeorder::application::registry::StateRegistry;
use placeorder::domain::cart::{Cart, CartItem};
use placeorder::domain::payment::{
    PaymentFlowStatus, PaymentInfo, PaymentIntent, PaymentIntentId, PaymentRequest,
    default_decision,
};
use placeorder::domain::ports::{OrderStore, PaymentGateway};
use placeorder::domain::process::OrderId;
use placeorder::error::{PlaceOrderError, Result};
use placeorder::infrastructure::in_memory::{
    InMemoryOrderStore, InMemoryPaymentGateway, InMemoryProcessStore,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const RETURN_URL: &str = "https://shop.example/checkout/return";

pub fn two_item_cart() -> Cart {
    Cart::new("cart-1", "EUR")
        .with_item(CartItem::new("sku-shirt", 2, dec!(19.90)))
        .with_item(CartItem::new("sku-socks", 1, dec!(4.50)))
        .with_contact_email("jane@example.com")
}

pub fn start_command(cart: Cart) -> StartPlaceOrderCommand {
    StartPlaceOrderCommand {
        cart,
        return_url: RETURN_URL.to_string(),
    }
}

/// Wraps the simulated gateway; voids can be made to fail and calls are counted.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    pub inner: InMemoryPaymentGateway,
    pub fail_void: bool,
    pub creates: Arc<AtomicUsize>,
    pub voids: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn failing_void() -> Self {
        Self {
            fail_void: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_intent(request).await
    }

    async fn query_status(&self, intent: &PaymentIntentId) -> Result<PaymentFlowStatus> {
        self.inner.query_status(intent).await
    }

    async fn void_intent(&self, intent: &PaymentIntentId) -> Result<()> {
        self.voids.fetch_add(1, Ordering::SeqCst);
        if self.fail_void {
            return Err(PlaceOrderError::GatewayError("void endpoint unavailable".to_string()));
        }
        self.inner.void_intent(intent).await
    }
}

/// Order store that refuses every order.
#[derive(Clone, Default)]
pub struct RejectingOrderStore;

#[async_trait]
impl OrderStore for RejectingOrderStore {
    async fn persist_order(&self, _cart: &Cart, _payment: &PaymentInfo) -> Result<OrderId> {
        Err(PlaceOrderError::OrderStoreError("warehouse closed".to_string()))
    }

    async fn cancel_order(&self, _order: &OrderId) -> Result<()> {
        Ok(())
    }
}

pub fn handler_with(
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderStore>,
) -> PlaceOrderHandler {
    let registry = StateRegistry::standard(gateway, orders, default_decision());
    PlaceOrderHandler::new(Box::new(InMemoryProcessStore::new()), registry)
}

pub fn default_handler(gateway: &ScriptedGateway) -> (PlaceOrderHandler, InMemoryOrderStore) {
    let orders = InMemoryOrderStore::new();
    let handler = handler_with(Arc::new(gateway.clone()), Arc::new(orders.clone()));
    (handler, orders)
}
