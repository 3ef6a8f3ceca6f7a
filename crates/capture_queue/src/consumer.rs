//! The per-message state machine of the capture pipeline: attempt, then
//! acknowledge, retry-with-delay, or poison.

use std::{sync::Arc, time::Duration};

use charge_models::{errors::ConflictError, Charge, ChargeStatus, GatewayError, GatewayOutcome};
use chargeflow_core::{
    errors::{OperationError, OperationResult, StorageErrorExt},
    executor::{ExecutionResult, GatewayExecutor},
    metrics,
    operations::{execute_charge_operation, CaptureOperation, ChargeOperationResult},
    EngineContext,
};
use chargeflow_interfaces::CaptureWorkMessage;
use error_stack::ResultExt;
use futures::future::join_all;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::settings::CaptureSettings;

/// How a message left the handler. Returned for logging and assertions; the
/// queue transport has already been told.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MessageDisposition {
    Acknowledged,
    RetryScheduled,
    Poisoned,
    LeftForRedelivery,
}

pub struct CaptureConsumer {
    state: EngineContext,
    executor: Arc<GatewayExecutor>,
    capture_budget: Duration,
    settings: CaptureSettings,
}

impl CaptureConsumer {
    pub fn new(
        state: EngineContext,
        executor: Arc<GatewayExecutor>,
        capture_budget: Duration,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            state,
            executor,
            capture_budget,
            settings,
        }
    }

    /// Periodic drain loop. Starts after a randomised splay so that a fleet
    /// of consumers does not fetch in lockstep; stops between ticks when the
    /// shutdown channel fires.
    #[instrument(skip_all)]
    pub async fn start(&self, mut shutdown: mpsc::Receiver<()>) {
        let splay = rand::thread_rng().gen_range(0..=self.settings.loop_interval_ms);
        tokio::time::sleep(Duration::from_millis(splay)).await;

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.settings.loop_interval_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.consume_batch().await {
                        // Receive failures must not kill the loop; the next
                        // tick tries again.
                        tracing::error!(?error, "failed to drain capture batch");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("terminating capture consumer");
                    break;
                }
            }
        }
    }

    /// Fetches one batch and handles every message independently. One bad
    /// message never halts the batch.
    #[instrument(skip_all)]
    pub async fn consume_batch(&self) -> OperationResult<usize> {
        let messages = self
            .state
            .queue
            .receive(self.settings.batch_size)
            .await
            .change_context(OperationError::Queue)?;
        let count = messages.len();

        join_all(
            messages
                .into_iter()
                .map(|message| self.process_message(message)),
        )
        .await;
        Ok(count)
    }

    async fn process_message(&self, message: CaptureWorkMessage) {
        match self.handle_message(&message).await {
            Ok(disposition) => tracing::info!(
                message_id = %message.message_id,
                charge_id = %message.charge_external_id,
                %disposition,
                "capture message handled"
            ),
            Err(error) => tracing::error!(
                message_id = %message.message_id,
                charge_id = %message.charge_external_id,
                ?error,
                "capture message failed; left for redelivery"
            ),
        }
    }

    /// Drives one message through a capture attempt and decides its fate.
    pub async fn handle_message(
        &self,
        message: &CaptureWorkMessage,
    ) -> OperationResult<MessageDisposition> {
        let state = self.state.clone();
        let charge_external_id = message.charge_external_id.clone();
        let work = async move {
            execute_charge_operation(&state, &CaptureOperation, &charge_external_id).await
        };

        match self.executor.execute(self.capture_budget, work).await {
            ExecutionResult::Completed(result) => self.settle(message, result).await,
            ExecutionResult::StillInProgress => {
                // The running attempt persists its own outcome; the
                // visibility timeout redelivers the message later.
                tracing::warn!(
                    charge_id = %message.charge_external_id,
                    "capture attempt still in progress past the wait budget"
                );
                Ok(MessageDisposition::LeftForRedelivery)
            }
            ExecutionResult::Failed(report) => self.handle_failure(message, report).await,
        }
    }

    async fn settle(
        &self,
        message: &CaptureWorkMessage,
        result: ChargeOperationResult,
    ) -> OperationResult<MessageDisposition> {
        match &result.outcome {
            GatewayOutcome::Response(_) => {
                self.acknowledge(message).await?;
                Ok(MessageDisposition::Acknowledged)
            }
            GatewayOutcome::Error(error) => {
                if result.charge.status == ChargeStatus::CaptureError {
                    // Non-retriable gateway error, already mapped terminally
                    // by the post-operation phase.
                    self.acknowledge(message).await?;
                    tracing::error!(
                        charge_id = %result.charge.external_id,
                        %error,
                        "capture failed terminally"
                    );
                    Ok(MessageDisposition::Poisoned)
                } else {
                    self.decide_retry(message, &result.charge, error).await
                }
            }
        }
    }

    /// Retry budget: capture attempts already used before this one, derived
    /// from the charge's own event history. The attempt that just failed has
    /// already appended its retry event, hence the subtraction.
    async fn decide_retry(
        &self,
        message: &CaptureWorkMessage,
        charge: &Charge,
        error: &GatewayError,
    ) -> OperationResult<MessageDisposition> {
        let attempts_before = charge.capture_retry_count().saturating_sub(1);

        if attempts_before < self.settings.maximum_retries {
            self.state
                .queue
                .schedule_retry(message, self.settings.retry_delay())
                .await
                .change_context(OperationError::Queue)?;
            tracing::warn!(
                charge_id = %charge.external_id,
                %error,
                attempt = attempts_before + 1,
                "capture attempt failed; retry scheduled"
            );
            Ok(MessageDisposition::RetryScheduled)
        } else {
            // Poison exit: the message must not be retried forever.
            let poisoned = self
                .state
                .repository
                .persist(charge, ChargeStatus::CaptureError)
                .await
                .map_err(StorageErrorExt::to_operation_error)?;
            self.acknowledge(message).await?;
            self.state.observability.increment_counter(
                metrics::CAPTURE_RETRIES_EXHAUSTED,
                &metrics::charge_tags(&poisoned),
            );
            tracing::error!(
                charge_id = %poisoned.external_id,
                retries = self.settings.maximum_retries,
                "capture retries exhausted; charge marked as capture error"
            );
            Ok(MessageDisposition::Poisoned)
        }
    }

    /// An illegal-transition conflict means a concurrent processor already
    /// advanced the charge. If it is captured, the message is an
    /// at-least-once duplicate and gets acknowledged; anything else
    /// propagates for natural redelivery.
    async fn handle_failure(
        &self,
        message: &CaptureWorkMessage,
        report: error_stack::Report<OperationError>,
    ) -> OperationResult<MessageDisposition> {
        let illegal_transition = matches!(
            report.current_context(),
            OperationError::Conflict(ConflictError::IllegalTransition { .. })
        );
        if !illegal_transition {
            return Err(report);
        }

        let charge = self
            .state
            .repository
            .find_by_external_id(&message.charge_external_id)
            .await
            .change_context(OperationError::Storage)?;
        match charge {
            Some(charge) if charge.status == ChargeStatus::Captured => {
                self.acknowledge(message).await?;
                tracing::info!(
                    charge_id = %charge.external_id,
                    "duplicate delivery for a captured charge; acknowledged"
                );
                Ok(MessageDisposition::Acknowledged)
            }
            _ => Err(report),
        }
    }

    async fn acknowledge(&self, message: &CaptureWorkMessage) -> OperationResult<()> {
        self.state
            .queue
            .acknowledge(message)
            .await
            .change_context(OperationError::Queue)
    }
}
