use super::registry::StateRegistry;
use crate::domain::process::{RollbackFailure, RollbackLedger};
use crate::error::PlaceOrderError;

/// What happened while unwinding a ledger.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RollbackReport {
    /// Names of the states whose compensation ran, in the order attempted.
    pub attempted: Vec<String>,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    /// True when every compensation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// The partial failure as an error value, if any compensation failed.
    pub fn as_error(&self) -> Option<PlaceOrderError> {
        if self.is_clean() {
            None
        } else {
            Some(PlaceOrderError::RollbackPartialFailure(self.failures.clone()))
        }
    }
}

/// Runs every ledger entry's compensation, last entry first.
///
/// A failing compensation is recorded and the unwind carries on with the
/// remaining entries.
pub async fn unwind(registry: &StateRegistry, ledger: &RollbackLedger) -> RollbackReport {
    let mut report = RollbackReport::default();

    for entry in ledger.unwind_order() {
        report.attempted.push(entry.state_name.clone());

        let result = match registry.resolve(&entry.state_name) {
            Ok(state) => state.rollback(&entry.data).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(state = %entry.state_name, error = %e, "rollback step failed");
            report.failures.push(RollbackFailure {
                state_name: entry.state_name.clone(),
                message: e.to_string(),
            });
        }
    }

    report
}
