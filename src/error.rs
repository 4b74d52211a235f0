use crate::domain::process::{FailedReason, RollbackFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceOrderError {
    #[error("another place order process is already running for this session")]
    AnotherProcessRunning,
    #[error("no place order process found for this session")]
    NoProcessFound,
    #[error("place order process is not in a final state")]
    ProcessNotFinal,
    #[error("place order process is already in a final state")]
    ProcessAlreadyFinal,
    #[error("state execution failed: {0}")]
    StateExecutionFailed(FailedReason),
    #[error("rollback failed for {} step(s): {}", .0.len(), format_failures(.0))]
    RollbackPartialFailure(Vec<RollbackFailure>),
    #[error("no state registered under name '{0}'")]
    UnknownState(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
    #[error("Order store error: {0}")]
    OrderStoreError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

fn format_failures(failures: &[RollbackFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.state_name, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PlaceOrderError {
    fn from(err: rocksdb::Error) -> Self {
        PlaceOrderError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PlaceOrderError>;
