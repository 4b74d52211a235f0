use crate::application::handler::{PlaceOrderHandler, StartPlaceOrderCommand};
use crate::domain::cart::SessionId;
use crate::domain::payment::PaymentAction;
use crate::domain::ports::CartProviderBox;
use crate::domain::process::{Process, StateData};
use crate::error::{PlaceOrderError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Result of a start request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPlaceOrderResult {
    pub uuid: String,
    /// False when an already running process was picked up instead.
    pub created: bool,
    pub state: String,
}

/// What a caller gets to see of a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceOrderContext {
    pub uuid: String,
    pub state: String,
    pub payment_action: Option<PaymentAction>,
    pub failed_reason: Option<String>,
    pub order_ids: Vec<String>,
    pub contact_email: Option<String>,
}

impl From<&Process> for PlaceOrderContext {
    fn from(process: &Process) -> Self {
        let payment_action = match process.current_state_data() {
            StateData::AwaitPaymentConfirmation { action, .. } => action.clone(),
            _ => None,
        };
        let info = process.place_order_info();
        Self {
            uuid: process.uuid().to_string(),
            state: process.current_state_name().to_string(),
            payment_action,
            failed_reason: process.failed_reason().map(|r| r.reason()),
            order_ids: info
                .map(|i| {
                    i.placed_order_infos
                        .iter()
                        .map(|o| o.order_id.to_string())
                        .collect()
                })
                .unwrap_or_default(),
            contact_email: info.map(|i| i.contact_email.clone()),
        }
    }
}

/// Thin adapter between a transport and the place-order handler.
///
/// Reads the session's cart, forwards commands, and turns a start conflict
/// into a refresh of the running process.
pub struct CheckoutController {
    handler: Arc<PlaceOrderHandler>,
    carts: CartProviderBox,
}

impl CheckoutController {
    /// Creates a new `CheckoutController`.
    ///
    /// # Arguments
    ///
    /// * `handler` - The engine commands are forwarded to.
    /// * `carts` - The source of the cart snapshot taken on start.
    pub fn new(handler: Arc<PlaceOrderHandler>, carts: CartProviderBox) -> Self {
        Self { handler, carts }
    }

    /// Starts checkout with the session's cart.
    ///
    /// When a process is already running it is refreshed instead and the
    /// result reports `created: false`.
    pub async fn start(
        &self,
        session: &SessionId,
        return_url: &str,
    ) -> Result<StartPlaceOrderResult> {
        let cart = self.carts.get_cart(session).await?;
        let command = StartPlaceOrderCommand {
            cart,
            return_url: return_url.to_string(),
        };

        match self.handler.start_place_order(session, command).await {
            Ok(process) => Ok(StartPlaceOrderResult {
                uuid: process.uuid().to_string(),
                created: true,
                state: process.current_state_name().to_string(),
            }),
            Err(PlaceOrderError::AnotherProcessRunning) => {
                tracing::info!(
                    session = %session,
                    "place order already running, refreshing it instead"
                );
                let process = self.handler.refresh_place_order(session).await?;
                Ok(StartPlaceOrderResult {
                    uuid: process.uuid().to_string(),
                    created: false,
                    state: process.current_state_name().to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Advances the running process, e.g. after the customer returns from the payment page.
    pub async fn refresh(&self, session: &SessionId) -> Result<PlaceOrderContext> {
        let process = self.handler.refresh_place_order(session).await?;
        Ok(PlaceOrderContext::from(&process))
    }

    /// Abandons the running process.
    pub async fn cancel(&self, session: &SessionId) -> Result<()> {
        self.handler.cancel_place_order(session).await
    }

    /// Forgets a finished process.
    pub async fn clear(&self, session: &SessionId) -> Result<()> {
        self.handler.clear_place_order(session).await
    }

    /// Where the session's process stands, without advancing it.
    pub async fn current(&self, session: &SessionId) -> Result<PlaceOrderContext> {
        let process = self.handler.current_context(session).await?;
        Ok(PlaceOrderContext::from(&process))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::StateRegistry;
    use crate::domain::cart::{Cart, CartItem};
    use crate::domain::payment::default_decision;
    use crate::domain::process::AWAIT_PAYMENT_CONFIRMATION;
    use crate::infrastructure::in_memory::{
        InMemoryCartProvider, InMemoryOrderStore, InMemoryPaymentGateway, InMemoryProcessStore,
    };
    use rust_decimal_macros::dec;

    async fn controller() -> CheckoutController {
        let registry = StateRegistry::standard(
            Arc::new(InMemoryPaymentGateway::new()),
            Arc::new(InMemoryOrderStore::new()),
            default_decision(),
        );
        let handler = PlaceOrderHandler::new(Box::new(InMemoryProcessStore::new()), registry);
        let carts = InMemoryCartProvider::new();
        carts
            .insert(
                SessionId::new("s1"),
                Cart::new("cart-1", "EUR")
                    .with_item(CartItem::new("sku-1", 1, dec!(9.99)))
                    .with_contact_email("jane@example.com"),
            )
            .await;
        CheckoutController::new(Arc::new(handler), Box::new(carts))
    }

    #[tokio::test]
    async fn test_second_start_falls_back_to_running_process() {
        let controller = controller().await;
        let session = SessionId::new("s1");

        let first = controller.start(&session, "https://shop.example/r").await.unwrap();
        let second = controller.start(&session, "https://shop.example/r").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.uuid, second.uuid);
    }

    #[tokio::test]
    async fn test_context_exposes_payment_redirect() {
        let controller = controller().await;
        let session = SessionId::new("s1");
        controller.start(&session, "https://shop.example/r").await.unwrap();

        let context = controller.current(&session).await.unwrap();
        assert_eq!(context.state, AWAIT_PAYMENT_CONFIRMATION);
        assert!(matches!(
            context.payment_action,
            Some(PaymentAction::Redirect { ref url }) if url.starts_with("https://pay.example/")
        ));
        assert!(context.failed_reason.is_none());
    }

    #[tokio::test]
    async fn test_start_without_cart_fails() {
        let controller = controller().await;
        let result = controller
            .start(&SessionId::new("ghost"), "https://shop.example/r")
            .await;
        assert!(matches!(result, Err(PlaceOrderError::ValidationError(_))));
    }
}
