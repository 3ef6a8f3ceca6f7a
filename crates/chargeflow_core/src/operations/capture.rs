use async_trait::async_trait;
use charge_models::{
    charge::ProviderKind, Charge, ChargeStatus, GatewayOutcome, OperationType,
};

use crate::{
    errors::{OperationResult, StorageErrorExt},
    operations::{persist_outcome, ChargeOperation},
    EngineContext,
};

/// Submits an approved charge for settlement.
#[derive(Debug)]
pub struct CaptureOperation;

#[async_trait]
impl ChargeOperation for CaptureOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::Capture
    }

    async fn post_operation(
        &self,
        state: &EngineContext,
        charge: Charge,
        outcome: &GatewayOutcome,
    ) -> OperationResult<Charge> {
        let mut persisted =
            persist_outcome(state, self.operation_type(), charge, outcome).await?;

        // Sandbox providers settle nothing externally, so no settlement
        // notification will ever arrive: finish the charge in the same call.
        if persisted.status == ChargeStatus::CaptureSubmitted
            && persisted.gateway_account.provider_kind == ProviderKind::Sandbox
        {
            persisted = state
                .repository
                .persist(&persisted, ChargeStatus::Captured)
                .await
                .map_err(StorageErrorExt::to_operation_error)?;
            tracing::info!(
                charge_id = %persisted.external_id,
                "sandbox provider; capture finished without settlement notification"
            );
        }

        if outcome.is_success() {
            // Confirmation delivery must not fail an otherwise successful
            // capture.
            if let Err(error) = state.notifier.notify_payment_confirmed(&persisted).await {
                tracing::error!(
                    charge_id = %persisted.external_id,
                    ?error,
                    "failed to send payment confirmation"
                );
            }
        }

        Ok(persisted)
    }
}
