use crate::domain::cart::{Cart, SessionId};
use crate::domain::payment::{
    PaymentAction, PaymentFlowStatus, PaymentInfo, PaymentIntent, PaymentIntentId,
    PaymentRequest, PaymentStatus,
};
use crate::domain::ports::{CartProvider, OrderStore, PaymentGateway, ProcessStore};
use crate::domain::process::{OrderId, Process};
use crate::error::{PlaceOrderError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for place-order processes.
///
/// Uses `Arc<RwLock<HashMap<SessionId, Process>>>`; clones share the map.
#[derive(Default, Clone)]
pub struct InMemoryProcessStore {
    processes: Arc<RwLock<HashMap<SessionId, Process>>>,
}

impl InMemoryProcessStore {
    /// Creates a new, empty in-memory process store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessStore for InMemoryProcessStore {
    async fn load(&self, session: &SessionId) -> Result<Option<Process>> {
        let processes = self.processes.read().await;
        Ok(processes.get(session).cloned())
    }

    async fn save(&self, session: &SessionId, process: &Process) -> Result<()> {
        let mut processes = self.processes.write().await;
        processes.insert(session.clone(), process.clone());
        Ok(())
    }

    async fn delete(&self, session: &SessionId) -> Result<()> {
        let mut processes = self.processes.write().await;
        processes.remove(session);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub cart: Cart,
    pub payment: PaymentInfo,
    pub status: OrderStatus,
}

/// In-memory order store; cancelling keeps the order but flags it.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, StoredOrder>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored order, cancelled ones included.
    pub async fn get(&self, order: &OrderId) -> Option<StoredOrder> {
        self.orders.read().await.get(order).cloned()
    }

    /// Number of orders ever placed.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn persist_order(&self, cart: &Cart, payment: &PaymentInfo) -> Result<OrderId> {
        let order_id = OrderId(format!("order-{}", Uuid::new_v4().simple()));
        let mut orders = self.orders.write().await;
        orders.insert(
            order_id.clone(),
            StoredOrder {
                cart: cart.clone(),
                payment: payment.clone(),
                status: OrderStatus::Placed,
            },
        );
        Ok(order_id)
    }

    async fn cancel_order(&self, order: &OrderId) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(order) {
            Some(stored) => {
                stored.status = OrderStatus::Cancelled;
                Ok(())
            }
            None => Err(PlaceOrderError::OrderStoreError(format!(
                "order {} not found",
                order
            ))),
        }
    }
}

/// A payment intent as tracked by the simulated gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedIntent {
    pub id: PaymentIntentId,
    pub reference: String,
    pub status: PaymentStatus,
    pub voided: bool,
}

/// Every intent known to a simulated gateway, so a later run can pick them up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub intents: Vec<SimulatedIntent>,
}

/// Durable storage for the simulated gateway's intents.
pub trait GatewaySnapshotStore: Send + Sync {
    fn load_gateway_snapshot(&self) -> Result<Option<GatewaySnapshot>>;
    fn save_gateway_snapshot(&self, snapshot: &GatewaySnapshot) -> Result<()>;
}

#[derive(Default)]
struct GatewayState {
    intents: HashMap<PaymentIntentId, SimulatedIntent>,
    by_reference: HashMap<String, PaymentIntentId>,
    initial_status: Option<PaymentStatus>,
}

/// Simulated payment provider.
///
/// Intents start `Unapproved` (or the configured initial status) with a
/// redirect to a hosted payment page; tests and the CLI move them along with
/// `set_status`. Clones share state.
#[derive(Default, Clone)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new simulated gateway whose intents start `Unapproved`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new simulated gateway whose intents start with `status`.
    pub fn with_initial_status(status: PaymentStatus) -> Self {
        let gateway = Self::new();
        gateway.lock().initial_status = Some(status);
        gateway
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports `status` for the intent created under `reference`.
    /// Returns false when no such intent exists.
    pub fn set_status(&self, reference: &str, status: PaymentStatus) -> bool {
        let mut state = self.lock();
        let Some(id) = state.by_reference.get(reference).cloned() else {
            return false;
        };
        match state.intents.get_mut(&id) {
            Some(intent) => {
                intent.status = status;
                true
            }
            None => false,
        }
    }

    /// Copies every known intent, ordered by reference.
    pub fn snapshot(&self) -> GatewaySnapshot {
        let mut intents: Vec<SimulatedIntent> = self.lock().intents.values().cloned().collect();
        intents.sort_by(|a, b| a.reference.cmp(&b.reference));
        GatewaySnapshot { intents }
    }

    /// Replaces the known intents with those of `snapshot`.
    pub fn restore(&self, snapshot: GatewaySnapshot) {
        let mut state = self.lock();
        state.intents.clear();
        state.by_reference.clear();
        for intent in snapshot.intents {
            state
                .by_reference
                .insert(intent.reference.clone(), intent.id.clone());
            state.intents.insert(intent.id.clone(), intent);
        }
    }

    /// Number of intents created so far.
    pub fn intent_count(&self) -> usize {
        self.lock().intents.len()
    }

    /// Whether the intent created under `reference` was voided.
    pub fn is_voided(&self, reference: &str) -> bool {
        let state = self.lock();
        state
            .by_reference
            .get(reference)
            .and_then(|id| state.intents.get(id))
            .is_some_and(|intent| intent.voided)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent> {
        let mut state = self.lock();
        let redirect = |id: &PaymentIntentId| PaymentAction::Redirect {
            url: format!(
                "https://pay.example/checkout/{}?return={}",
                id, request.return_url
            ),
        };

        if let Some(id) = state.by_reference.get(&request.reference) {
            return Ok(PaymentIntent {
                id: id.clone(),
                action: Some(redirect(id)),
            });
        }

        let id = PaymentIntentId(format!("pi_{}", Uuid::new_v4().simple()));
        let status = state.initial_status.unwrap_or(PaymentStatus::Unapproved);
        state.intents.insert(
            id.clone(),
            SimulatedIntent {
                id: id.clone(),
                reference: request.reference.clone(),
                status,
                voided: false,
            },
        );
        state.by_reference.insert(request.reference.clone(), id.clone());

        Ok(PaymentIntent {
            action: Some(redirect(&id)),
            id,
        })
    }

    async fn query_status(&self, intent: &PaymentIntentId) -> Result<PaymentFlowStatus> {
        let state = self.lock();
        let stored = state
            .intents
            .get(intent)
            .ok_or_else(|| PlaceOrderError::GatewayError(format!("unknown intent {}", intent)))?;

        if stored.voided {
            return Ok(PaymentFlowStatus {
                status: PaymentStatus::Cancelled,
                action: None,
                error: Some(format!("intent for {} was voided", stored.reference)),
            });
        }
        Ok(PaymentFlowStatus::new(stored.status))
    }

    async fn void_intent(&self, intent: &PaymentIntentId) -> Result<()> {
        let mut state = self.lock();
        let stored = state
            .intents
            .get_mut(intent)
            .ok_or_else(|| PlaceOrderError::GatewayError(format!("unknown intent {}", intent)))?;
        if stored.status == PaymentStatus::Completed {
            return Err(PlaceOrderError::GatewayError(format!(
                "intent {} is already captured",
                intent
            )));
        }
        stored.voided = true;
        Ok(())
    }
}

/// Cart provider backed by a session → cart map, optionally read from a JSON file.
#[derive(Default, Clone)]
pub struct InMemoryCartProvider {
    carts: Arc<RwLock<HashMap<SessionId, Cart>>>,
}

impl InMemoryCartProvider {
    /// Creates a new cart provider without any carts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{ "<session>": <cart>, ... }`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let carts: HashMap<SessionId, Cart> = serde_json::from_slice(&bytes)?;
        Ok(Self {
            carts: Arc::new(RwLock::new(carts)),
        })
    }

    /// Registers `cart` as the cart of `session`.
    pub async fn insert(&self, session: SessionId, cart: Cart) {
        self.carts.write().await.insert(session, cart);
    }
}

#[async_trait]
impl CartProvider for InMemoryCartProvider {
    async fn get_cart(&self, session: &SessionId) -> Result<Cart> {
        let carts = self.carts.read().await;
        carts.get(session).cloned().ok_or_else(|| {
            PlaceOrderError::ValidationError(format!("no cart for session {}", session))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartItem;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn cart() -> Cart {
        Cart::new("cart-1", "EUR")
            .with_item(CartItem::new("sku-1", 1, dec!(10.0)))
            .with_contact_email("jane@example.com")
    }

    fn request(reference: &str) -> PaymentRequest {
        PaymentRequest {
            reference: reference.to_string(),
            amount: dec!(10.0),
            currency: "EUR".to_string(),
            return_url: "https://shop.example/return".to_string(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_process_store() {
        let store = InMemoryProcessStore::new();
        let session = SessionId::new("s1");
        let process = Process::new(cart(), "https://shop.example/return".to_string());

        store.save(&session, &process).await.unwrap();
        assert_eq!(store.load(&session).await.unwrap(), Some(process));
        assert!(store.load(&SessionId::new("s2")).await.unwrap().is_none());

        store.delete(&session).await.unwrap();
        assert!(store.load(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_gateway_create_is_idempotent_per_reference() {
        let gateway = InMemoryPaymentGateway::new();
        let first = gateway.create_intent(request("ref-1")).await.unwrap();
        let second = gateway.create_intent(request("ref-1")).await.unwrap();
        let other = gateway.create_intent(request("ref-2")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
        assert_eq!(gateway.intent_count(), 2);
    }

    #[tokio::test]
    async fn test_gateway_status_and_void() {
        let gateway = InMemoryPaymentGateway::new();
        let intent = gateway.create_intent(request("ref-1")).await.unwrap();
        assert_eq!(
            gateway.query_status(&intent.id).await.unwrap().status,
            PaymentStatus::Unapproved
        );

        assert!(gateway.set_status("ref-1", PaymentStatus::Approved));
        assert!(!gateway.set_status("missing", PaymentStatus::Approved));
        assert_eq!(
            gateway.query_status(&intent.id).await.unwrap().status,
            PaymentStatus::Approved
        );

        gateway.void_intent(&intent.id).await.unwrap();
        assert!(gateway.is_voided("ref-1"));
        assert_eq!(
            gateway.query_status(&intent.id).await.unwrap().status,
            PaymentStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_gateway_refuses_to_void_captured_payment() {
        let gateway = InMemoryPaymentGateway::with_initial_status(PaymentStatus::Completed);
        let intent = gateway.create_intent(request("ref-1")).await.unwrap();
        assert!(matches!(
            gateway.void_intent(&intent.id).await,
            Err(PlaceOrderError::GatewayError(_))
        ));
    }

    #[tokio::test]
    async fn test_gateway_restored_from_snapshot() {
        let gateway = InMemoryPaymentGateway::new();
        let first = gateway.create_intent(request("ref-1")).await.unwrap();
        gateway.create_intent(request("ref-2")).await.unwrap();
        gateway.void_intent(&first.id).await.unwrap();

        let restarted = InMemoryPaymentGateway::new();
        restarted.restore(gateway.snapshot());

        assert_eq!(restarted.snapshot(), gateway.snapshot());
        assert!(restarted.is_voided("ref-1"));
        assert!(restarted.set_status("ref-2", PaymentStatus::Completed));
        let again = restarted.create_intent(request("ref-1")).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(restarted.intent_count(), 2);
    }

    #[tokio::test]
    async fn test_order_store_cancel() {
        let store = InMemoryOrderStore::new();
        let payment = PaymentInfo {
            gateway: "simulated".to_string(),
            intent_id: PaymentIntentId("pi_1".to_string()),
            amount: dec!(10.0),
            currency: "EUR".to_string(),
            status: PaymentStatus::Completed,
        };
        let order = store.persist_order(&cart(), &payment).await.unwrap();
        assert_eq!(store.get(&order).await.unwrap().status, OrderStatus::Placed);

        store.cancel_order(&order).await.unwrap();
        assert_eq!(store.get(&order).await.unwrap().status, OrderStatus::Cancelled);

        assert!(store.cancel_order(&OrderId("nope".to_string())).await.is_err());
    }

    #[tokio::test]
    async fn test_cart_provider_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"s1": {{"id": "c1", "currency": "EUR", "contact_email": "a@b.c",
                "items": [{{"sku": "x", "quantity": 2, "unit_price": "1.5"}}]}}}}"#
        )
        .unwrap();

        let provider = InMemoryCartProvider::from_json_file(file.path()).unwrap();
        let cart = provider.get_cart(&SessionId::new("s1")).await.unwrap();
        assert_eq!(cart.grand_total().unwrap(), dec!(3.0));
        assert!(provider.get_cart(&SessionId::new("s2")).await.is_err());
    }
}
