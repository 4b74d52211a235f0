use crate::domain::cart::Cart;
use crate::domain::payment::{PaymentAction, PaymentInfo, PaymentIntentId};
use crate::error::{PlaceOrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const VALIDATE_CART: &str = "ValidateCart";
pub const CREATE_PAYMENT: &str = "CreatePayment";
pub const AWAIT_PAYMENT_CONFIRMATION: &str = "AwaitPaymentConfirmation";
pub const PERSIST_ORDER: &str = "PersistOrder";
pub const SUCCESS: &str = "Success";
pub const FAILED: &str = "Failed";

/// Categorized cause recorded when a process ends in the Failed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailedReason {
    CartValidation { message: String },
    PaymentError { message: String },
    PaymentCanceledByCustomer,
    CanceledByCustomer,
    PlaceOrderFailed { message: String },
    Error { message: String },
}

impl FailedReason {
    /// Wraps a cart error, keeping only the message of a `ValidationError`.
    pub fn cart_validation(err: PlaceOrderError) -> Self {
        let message = match err {
            PlaceOrderError::ValidationError(message) => message,
            other => other.to_string(),
        };
        FailedReason::CartValidation { message }
    }

    /// Human-readable description shown to the customer.
    pub fn reason(&self) -> String {
        match self {
            FailedReason::CartValidation { message } => {
                format!("cart validation failed: {}", message)
            }
            FailedReason::PaymentError { message } => format!("payment failed: {}", message),
            FailedReason::PaymentCanceledByCustomer => {
                "payment was canceled by the customer".to_string()
            }
            FailedReason::CanceledByCustomer => "checkout was canceled by the customer".to_string(),
            FailedReason::PlaceOrderFailed { message } => {
                format!("order could not be placed: {}", message)
            }
            FailedReason::Error { message } => format!("unexpected error: {}", message),
        }
    }
}

impl fmt::Display for FailedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrderInfo {
    pub order_id: OrderId,
    pub cart_id: String,
}

/// Result data of a successfully placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderInfo {
    pub payment_infos: Vec<PaymentInfo>,
    pub placed_order_infos: Vec<PlacedOrderInfo>,
    pub contact_email: String,
}

/// Data handed from a completed state to the state that follows it.
///
/// The variant tag names the state that consumes the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data")]
pub enum StateData {
    ValidateCart,
    CreatePayment,
    AwaitPaymentConfirmation {
        intent_id: PaymentIntentId,
        action: Option<PaymentAction>,
    },
    PersistOrder {
        payment: PaymentInfo,
    },
    Success(PlaceOrderInfo),
    Failed,
}

impl StateData {
    /// Name of the state this data belongs to.
    pub fn state_name(&self) -> &'static str {
        match self {
            StateData::ValidateCart => VALIDATE_CART,
            StateData::CreatePayment => CREATE_PAYMENT,
            StateData::AwaitPaymentConfirmation { .. } => AWAIT_PAYMENT_CONFIRMATION,
            StateData::PersistOrder { .. } => PERSIST_ORDER,
            StateData::Success(_) => SUCCESS,
            StateData::Failed => FAILED,
        }
    }
}

/// Compensating-action payload recorded when a state completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RollbackData {
    Nothing,
    VoidPayment { intent_id: PaymentIntentId },
    CancelOrder { order_id: OrderId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub state_name: String,
    pub data: RollbackData,
}

/// Ordered record of reversible effects, one entry per completed state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollbackLedger(Vec<RollbackEntry>);

impl RollbackLedger {
    /// Records the rollback data of a completed state.
    pub(crate) fn append(&mut self, state_name: impl Into<String>, data: RollbackData) {
        self.0.push(RollbackEntry {
            state_name: state_name.into(),
            data,
        });
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in execution order.
    pub fn entries(&self) -> &[RollbackEntry] {
        &self.0
    }

    /// Entries in the order they must be compensated (last in, first out).
    pub fn unwind_order(&self) -> impl Iterator<Item = &RollbackEntry> {
        self.0.iter().rev()
    }
}

/// A compensating action that failed while unwinding the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackFailure {
    pub state_name: String,
    pub message: String,
}

/// Persisted place-order attempt.
///
/// Fields are only mutated by the engine; everyone else gets read access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    uuid: Uuid,
    cart: Cart,
    current_state_name: String,
    current_state_data: StateData,
    rollback_ledger: RollbackLedger,
    failed_reason: Option<FailedReason>,
    place_order_info: Option<PlaceOrderInfo>,
    return_url: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rollback_failures: Vec<RollbackFailure>,
}

impl Process {
    /// Creates a new process with a fresh UUID, positioned at `ValidateCart`.
    pub(crate) fn new(cart: Cart, return_url: String) -> Self {
        let initial = StateData::ValidateCart;
        Self {
            uuid: Uuid::new_v4(),
            cart,
            current_state_name: initial.state_name().to_string(),
            current_state_data: initial,
            rollback_ledger: RollbackLedger::default(),
            failed_reason: None,
            place_order_info: None,
            return_url,
            created_at: Utc::now(),
            rollback_failures: Vec::new(),
        }
    }

    /// Identifier of this attempt; also used as the payment reference.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The cart snapshot taken on start.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Name of the state that runs next, or of the final state.
    pub fn current_state_name(&self) -> &str {
        &self.current_state_name
    }

    pub fn current_state_data(&self) -> &StateData {
        &self.current_state_data
    }

    /// Compensations recorded so far, oldest first.
    pub fn rollback_ledger(&self) -> &RollbackLedger {
        &self.rollback_ledger
    }

    /// Set once the process ended in Failed.
    pub fn failed_reason(&self) -> Option<&FailedReason> {
        self.failed_reason.as_ref()
    }

    /// Set once the process ended in Success.
    pub fn place_order_info(&self) -> Option<&PlaceOrderInfo> {
        self.place_order_info.as_ref()
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Compensations that failed while unwinding.
    pub fn rollback_failures(&self) -> &[RollbackFailure] {
        &self.rollback_failures
    }

    /// Outcome of a finished process.
    pub fn outcome(&self) -> Result<&PlaceOrderInfo> {
        if let Some(info) = &self.place_order_info {
            return Ok(info);
        }
        match &self.failed_reason {
            Some(reason) => Err(PlaceOrderError::StateExecutionFailed(reason.clone())),
            None => Err(PlaceOrderError::ProcessNotFinal),
        }
    }

    /// Records the completed state's rollback data and moves on to `next`.
    pub(crate) fn advance(&mut self, completed: &str, rollback: RollbackData, next: StateData) {
        self.rollback_ledger.append(completed, rollback);
        if let StateData::Success(info) = &next {
            self.place_order_info = Some(info.clone());
        }
        self.current_state_name = next.state_name().to_string();
        self.current_state_data = next;
    }

    /// Moves the process into the Failed state once the ledger has been unwound.
    pub(crate) fn fail(&mut self, reason: FailedReason, rollback_failures: Vec<RollbackFailure>) {
        self.failed_reason = Some(reason);
        self.rollback_failures = rollback_failures;
        self.current_state_name = FAILED.to_string();
        self.current_state_data = StateData::Failed;
    }
}
