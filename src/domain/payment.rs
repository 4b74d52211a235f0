//! Payment gateway status model and the decision strategies that turn a
//! reported status into the next place-order transition.

use crate::domain::process::FailedReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of a payment intent as issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentIntentId(pub String);

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unapproved,
    Approved,
    Completed,
    /// The customer walked away from the payment page.
    Aborted,
    Failed,
    Cancelled,
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unapproved" => Ok(Self::Unapproved),
            "approved" => Ok(Self::Approved),
            "completed" => Ok(Self::Completed),
            "aborted" => Ok(Self::Aborted),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// What the customer has to do while a payment is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentAction {
    Redirect {
        url: String,
    },
    PostRedirect {
        url: String,
        form_fields: BTreeMap<String, String>,
    },
    ShowIframe {
        url: String,
    },
    ShowHtml {
        html: String,
    },
    WaitForCustomer,
}

/// Parameters sent to the gateway to register a payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Idempotency key; the gateway returns the existing intent when it already
    /// holds one for this reference.
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub action: Option<PaymentAction>,
}

/// Status of a payment intent as reported by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFlowStatus {
    pub status: PaymentStatus,
    pub action: Option<PaymentAction>,
    pub error: Option<String>,
}

impl PaymentFlowStatus {
    /// A status report without action or error.
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            status,
            action: None,
            error: None,
        }
    }
}

/// Confirmation record kept once a payment has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub gateway: String,
    pub intent_id: PaymentIntentId,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentDecision {
    Confirmed,
    Pending,
    Declined(FailedReason),
}

/// Strategy deciding the next transition from the gateway's reported status.
pub type PaymentDecisionFn = Arc<dyn Fn(&PaymentFlowStatus) -> PaymentDecision + Send + Sync>;

fn declined(flow: &PaymentFlowStatus) -> PaymentDecision {
    let message = flow
        .error
        .clone()
        .unwrap_or_else(|| format!("payment {:?}", flow.status).to_lowercase());
    PaymentDecision::Declined(FailedReason::PaymentError { message })
}

/// Accepts a payment as soon as the gateway approved it.
pub fn lenient_decision(flow: &PaymentFlowStatus) -> PaymentDecision {
    match flow.status {
        PaymentStatus::Approved | PaymentStatus::Completed => PaymentDecision::Confirmed,
        PaymentStatus::Unapproved => PaymentDecision::Pending,
        PaymentStatus::Aborted => {
            PaymentDecision::Declined(FailedReason::PaymentCanceledByCustomer)
        }
        PaymentStatus::Failed | PaymentStatus::Cancelled => declined(flow),
    }
}

/// Only a completed (captured) payment confirms; approval keeps waiting.
pub fn strict_decision(flow: &PaymentFlowStatus) -> PaymentDecision {
    match flow.status {
        PaymentStatus::Completed => PaymentDecision::Confirmed,
        PaymentStatus::Approved => PaymentDecision::Pending,
        _ => lenient_decision(flow),
    }
}

/// The lenient strategy, boxed for injection.
pub fn default_decision() -> PaymentDecisionFn {
    Arc::new(lenient_decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_decision() {
        let decide = |s| lenient_decision(&PaymentFlowStatus::new(s));
        assert_eq!(decide(PaymentStatus::Approved), PaymentDecision::Confirmed);
        assert_eq!(decide(PaymentStatus::Completed), PaymentDecision::Confirmed);
        assert_eq!(decide(PaymentStatus::Unapproved), PaymentDecision::Pending);
        assert_eq!(
            decide(PaymentStatus::Aborted),
            PaymentDecision::Declined(FailedReason::PaymentCanceledByCustomer)
        );
        assert!(matches!(
            decide(PaymentStatus::Failed),
            PaymentDecision::Declined(FailedReason::PaymentError { .. })
        ));
    }

    #[test]
    fn test_strict_decision_waits_for_capture() {
        let approved = PaymentFlowStatus::new(PaymentStatus::Approved);
        assert_eq!(strict_decision(&approved), PaymentDecision::Pending);

        let completed = PaymentFlowStatus::new(PaymentStatus::Completed);
        assert_eq!(strict_decision(&completed), PaymentDecision::Confirmed);
    }

    #[test]
    fn test_declined_keeps_gateway_error() {
        let mut flow = PaymentFlowStatus::new(PaymentStatus::Cancelled);
        flow.error = Some("card expired".to_string());
        assert_eq!(
            lenient_decision(&flow),
            PaymentDecision::Declined(FailedReason::PaymentError {
                message: "card expired".to_string()
            })
        );
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Completed));
        assert_eq!(" canceled ".parse::<PaymentStatus>(), Ok(PaymentStatus::Cancelled));
        assert!("paid".parse::<PaymentStatus>().is_err());
    }
}
