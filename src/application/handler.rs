use super::locks::SessionLocks;
use super::registry::StateRegistry;
use super::rollback;
use crate::domain::cart::{Cart, SessionId};
use crate::domain::ports::ProcessStoreBox;
use crate::domain::process::{FailedReason, Process};
use crate::domain::state::RunResult;
use crate::error::{PlaceOrderError, Result};
use tracing::instrument;

/// Default bound on transitions executed by a single command.
pub const DEFAULT_MAX_STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transitions a single start/refresh may run before the process is failed.
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartPlaceOrderCommand {
    pub cart: Cart,
    pub return_url: String,
}

/// Drives place-order processes, one per session.
///
/// Every command takes the session's lock for its whole duration, so for a
/// given session start, refresh, cancel and clear never interleave.
pub struct PlaceOrderHandler {
    process_store: ProcessStoreBox,
    registry: StateRegistry,
    config: EngineConfig,
    locks: SessionLocks,
}

impl PlaceOrderHandler {
    /// Creates a new `PlaceOrderHandler` with the default `EngineConfig`.
    ///
    /// # Arguments
    ///
    /// * `process_store` - The session-keyed store processes are persisted in.
    /// * `registry` - Resolves persisted state names to their implementations.
    pub fn new(process_store: ProcessStoreBox, registry: StateRegistry) -> Self {
        Self::with_config(process_store, registry, EngineConfig::default())
    }

    /// Creates a new `PlaceOrderHandler` with an explicit `EngineConfig`.
    pub fn with_config(
        process_store: ProcessStoreBox,
        registry: StateRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            process_store,
            registry,
            config,
            locks: SessionLocks::default(),
        }
    }

    /// Starts a new process and runs it until it waits on the customer or finishes.
    ///
    /// Fails with `AnotherProcessRunning` while the session still has an
    /// unfinished process. A finished one is replaced.
    #[instrument(skip_all, fields(session = %session))]
    pub async fn start_place_order(
        &self,
        session: &SessionId,
        command: StartPlaceOrderCommand,
    ) -> Result<Process> {
        let _guard = self.locks.acquire(session).await;

        if let Some(existing) = self.process_store.load(session).await? {
            if !self.is_final(&existing) {
                return Err(PlaceOrderError::AnotherProcessRunning);
            }
            tracing::debug!(previous = %existing.uuid(), "replacing finished process");
        }

        let url = &command.return_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PlaceOrderError::ValidationError(format!("invalid return URL '{}'", url)));
        }

        let mut process = Process::new(command.cart, command.return_url);
        tracing::info!(process = %process.uuid(), "place order process started");
        self.process_store.save(session, &process).await?;

        self.run(session, &mut process).await?;
        Ok(process)
    }

    /// Re-enters the current state, e.g. to check whether an external payment went through.
    ///
    /// A finished process is returned unchanged.
    #[instrument(skip_all, fields(session = %session))]
    pub async fn refresh_place_order(&self, session: &SessionId) -> Result<Process> {
        let _guard = self.locks.acquire(session).await;

        let mut process = self.load(session).await?;
        if self.is_final(&process) {
            return Ok(process);
        }

        self.run(session, &mut process).await?;
        Ok(process)
    }

    /// Abandons the current process: unwinds the ledger and ends in Failed.
    #[instrument(skip_all, fields(session = %session))]
    pub async fn cancel_place_order(&self, session: &SessionId) -> Result<()> {
        let _guard = self.locks.acquire(session).await;

        let mut process = self.load(session).await?;
        if self.is_final(&process) {
            return Err(PlaceOrderError::ProcessAlreadyFinal);
        }

        tracing::info!(
            process = %process.uuid(),
            state = process.current_state_name(),
            "cancelling place order process"
        );
        self.fail(session, &mut process, FailedReason::CanceledByCustomer)
            .await
    }

    /// The persisted process, without advancing it.
    pub async fn current_context(&self, session: &SessionId) -> Result<Process> {
        let _guard = self.locks.acquire(session).await;
        self.load(session).await
    }

    /// Removes a finished process. Clearing an empty session is a no-op.
    #[instrument(skip_all, fields(session = %session))]
    pub async fn clear_place_order(&self, session: &SessionId) -> Result<()> {
        let _guard = self.locks.acquire(session).await;

        let Some(process) = self.process_store.load(session).await? else {
            return Ok(());
        };
        if !self.is_final(&process) {
            return Err(PlaceOrderError::ProcessNotFinal);
        }

        self.process_store.delete(session).await?;
        tracing::info!(process = %process.uuid(), "place order process cleared");
        Ok(())
    }

    /// Whether the session has a process that is not final yet.
    pub async fn has_unfinished_process(&self, session: &SessionId) -> Result<bool> {
        let _guard = self.locks.acquire(session).await;
        match self.process_store.load(session).await? {
            Some(process) => Ok(!self.is_final(&process)),
            None => Ok(false),
        }
    }

    async fn load(&self, session: &SessionId) -> Result<Process> {
        self.process_store
            .load(session)
            .await?
            .ok_or(PlaceOrderError::NoProcessFound)
    }

    /// A process carrying an outcome is final whatever its state name resolves to.
    /// An unregistered state name counts as unfinished; the next run fails it.
    fn is_final(&self, process: &Process) -> bool {
        if process.failed_reason().is_some() || process.place_order_info().is_some() {
            return true;
        }
        self.registry
            .resolve(process.current_state_name())
            .is_ok_and(|state| state.is_final())
    }

    /// Runs states until one is pending or a final state is reached.
    async fn run(&self, session: &SessionId, process: &mut Process) -> Result<()> {
        let mut steps = 0;

        loop {
            let state = match self.registry.resolve(process.current_state_name()) {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!(
                        process = %process.uuid(),
                        error = %e,
                        "current state cannot be resolved"
                    );
                    let reason = FailedReason::Error {
                        message: e.to_string(),
                    };
                    return self.fail(session, process, reason).await;
                }
            };
            if state.is_final() {
                tracing::info!(
                    process = %process.uuid(),
                    state = state.name(),
                    "place order process finished"
                );
                return Ok(());
            }

            if steps == self.config.max_steps {
                tracing::error!(
                    process = %process.uuid(),
                    max_steps = self.config.max_steps,
                    "transition limit exceeded"
                );
                let reason = FailedReason::Error {
                    message: format!(
                        "exceeded {} transitions in a single run",
                        self.config.max_steps
                    ),
                };
                return self.fail(session, process, reason).await;
            }
            steps += 1;

            match state.run(process, process.current_state_data()).await {
                RunResult::Advance { next, rollback } => {
                    tracing::debug!(from = state.name(), to = next.state_name(), "transition");
                    process.advance(state.name(), rollback, next);
                    self.process_store.save(session, process).await?;
                }
                RunResult::Pending => {
                    tracing::debug!(state = state.name(), "state pending");
                    self.process_store.save(session, process).await?;
                    return Ok(());
                }
                RunResult::Failed(reason) => {
                    tracing::warn!(state = state.name(), reason = %reason, "state failed");
                    return self.fail(session, process, reason).await;
                }
            }
        }
    }

    /// Unwinds the ledger and persists the process in the Failed state.
    ///
    /// Compensation errors are logged and kept on the process; they never keep
    /// the process from becoming final.
    async fn fail(
        &self,
        session: &SessionId,
        process: &mut Process,
        reason: FailedReason,
    ) -> Result<()> {
        let report = rollback::unwind(&self.registry, process.rollback_ledger()).await;
        if let Some(err) = report.as_error() {
            tracing::warn!(process = %process.uuid(), error = %err, "rollback incomplete");
        }

        process.fail(reason, report.failures);
        self.process_store.save(session, process).await
    }
}
