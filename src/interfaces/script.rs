use super::controller::CheckoutController;
use super::csv::command_reader::{CommandKind, ScriptCommand};
use super::csv::outcome_writer::OutcomeRecord;
use crate::domain::cart::SessionId;
use crate::domain::payment::PaymentStatus;
use crate::error::{PlaceOrderError, Result};
use crate::infrastructure::in_memory::InMemoryPaymentGateway;

/// Executes command-script rows against the controller.
///
/// `gateway` rows drive the simulated payment provider so a script can play
/// the customer paying (or not) between refreshes.
pub struct ScriptRunner {
    controller: CheckoutController,
    gateway: InMemoryPaymentGateway,
}

impl ScriptRunner {
    /// Creates a new `ScriptRunner`.
    ///
    /// # Arguments
    ///
    /// * `controller` - Receives the checkout commands.
    /// * `gateway` - The simulated gateway `gateway` rows act on; must be the
    ///   one the controller's states use.
    pub fn new(controller: CheckoutController, gateway: InMemoryPaymentGateway) -> Self {
        Self {
            controller,
            gateway,
        }
    }

    /// Runs one command; failures end up in the record's `error` column.
    pub async fn execute(&self, command: &ScriptCommand) -> OutcomeRecord {
        let session = SessionId::new(command.session.clone());
        let mut record = OutcomeRecord {
            session: command.session.clone(),
            command: format!("{:?}", command.command).to_lowercase(),
            ..Default::default()
        };

        if let Err(e) = self.dispatch(&session, command).await {
            record.error = e.to_string();
        }

        // report where the process stands after the command
        if let Ok(context) = self.controller.current(&session).await {
            record.uuid = context.uuid;
            record.state = context.state;
            record.failed_reason = context.failed_reason.unwrap_or_default();
        }
        record
    }

    async fn dispatch(&self, session: &SessionId, command: &ScriptCommand) -> Result<()> {
        match command.command {
            CommandKind::Start => {
                let return_url = command.arg.as_deref().ok_or_else(|| {
                    PlaceOrderError::ValidationError("start requires a return URL".to_string())
                })?;
                self.controller.start(session, return_url).await?;
            }
            CommandKind::Refresh => {
                self.controller.refresh(session).await?;
            }
            CommandKind::Cancel => self.controller.cancel(session).await?,
            CommandKind::Context => {
                self.controller.current(session).await?;
            }
            CommandKind::Clear => self.controller.clear(session).await?,
            CommandKind::Gateway => {
                let status: PaymentStatus = command
                    .arg
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .map_err(PlaceOrderError::ValidationError)?;
                let context = self.controller.current(session).await?;
                if !self.gateway.set_status(&context.uuid, status) {
                    return Err(PlaceOrderError::GatewayError(format!(
                        "no payment registered for process {}",
                        context.uuid
                    )));
                }
            }
        }
        Ok(())
    }
}
