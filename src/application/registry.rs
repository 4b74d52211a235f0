use super::states::{
    AwaitPaymentConfirmation, CreatePayment, Failed, PersistOrder, Success, ValidateCart,
};
use crate::domain::payment::PaymentDecisionFn;
use crate::domain::ports::{OrderStoreRef, PaymentGatewayRef};
use crate::domain::state::{State, StateRef};
use crate::error::{PlaceOrderError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps persisted state names back to their implementations.
#[derive(Clone, Default)]
pub struct StateRegistry {
    states: HashMap<&'static str, StateRef>,
}

impl StateRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the canonical checkout flow:
    /// ValidateCart → CreatePayment → AwaitPaymentConfirmation → PersistOrder → Success.
    pub fn standard(
        gateway: PaymentGatewayRef,
        orders: OrderStoreRef,
        decide: PaymentDecisionFn,
    ) -> Self {
        Self::new()
            .with_state(ValidateCart)
            .with_state(CreatePayment::new(gateway.clone()))
            .with_state(AwaitPaymentConfirmation::new(gateway, decide))
            .with_state(PersistOrder::new(orders))
            .with_state(Success)
            .with_state(Failed)
    }

    /// Registers `state`, replacing any implementation already using its name.
    pub fn with_state<S: State + 'static>(mut self, state: S) -> Self {
        self.register(Arc::new(state));
        self
    }

    /// Registers `state` under its name, replacing any previous holder.
    pub fn register(&mut self, state: StateRef) {
        self.states.insert(state.name(), state);
    }

    /// Looks up the implementation persisted under `name`.
    ///
    /// Fails with `UnknownState` when nothing is registered under it.
    pub fn resolve(&self, name: &str) -> Result<StateRef> {
        self.states
            .get(name)
            .cloned()
            .ok_or_else(|| PlaceOrderError::UnknownState(name.to_string()))
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::default_decision;
    use crate::domain::process::{FAILED, SUCCESS, VALIDATE_CART};
    use crate::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentGateway};

    fn registry() -> StateRegistry {
        StateRegistry::standard(
            Arc::new(InMemoryPaymentGateway::new()),
            Arc::new(InMemoryOrderStore::new()),
            default_decision(),
        )
    }

    #[test]
    fn test_standard_registry_resolves_all_states() {
        let registry = registry();
        assert_eq!(registry.len(), 6);
        assert!(!registry.resolve(VALIDATE_CART).unwrap().is_final());
        assert!(registry.resolve(SUCCESS).unwrap().is_final());
        assert!(registry.resolve(FAILED).unwrap().is_final());
    }

    #[test]
    fn test_unknown_state() {
        assert!(matches!(
            registry().resolve("ShowIframe"),
            Err(PlaceOrderError::UnknownState(name)) if name == "ShowIframe"
        ));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let registry = registry().with_state(ValidateCart);
        assert_eq!(registry.len(), 6);
    }
}
