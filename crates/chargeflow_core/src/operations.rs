//! The shared three-phase shape of every gateway-calling operation:
//! lock-and-validate, call gateway, persist-and-notify.

mod authorise;
mod authorise_3ds;
mod capture;

use async_trait::async_trait;
pub use authorise::AuthoriseOperation;
pub use authorise_3ds::Authorise3dsResponseOperation;
pub use capture::CaptureOperation;
use charge_models::{
    state_machine, Charge, GatewayOutcome, GatewayRequest, OperationType,
};
use tracing::instrument;

use crate::{
    errors::{ConflictErrorExt, OperationResult, StorageErrorExt},
    metrics, EngineContext,
};

#[derive(Debug)]
pub struct ChargeOperationResult {
    pub charge: Charge,
    pub outcome: GatewayOutcome,
}

/// One gateway-calling operation. Implementations override the phases they
/// need; the defaults cover the common case.
#[async_trait]
pub trait ChargeOperation: Send + Sync + std::fmt::Debug {
    fn operation_type(&self) -> OperationType;

    /// Operation-specific setup that must happen exactly once per attempt,
    /// between claiming the charge and the gateway call. Mutations here stay
    /// in memory until phase 3 persists them.
    async fn pre_operation(
        &self,
        _state: &EngineContext,
        charge: Charge,
    ) -> OperationResult<Charge> {
        Ok(charge)
    }

    /// The only phase allowed to perform network I/O. Returns an outcome
    /// with gateway errors folded in as values and mutates no persisted
    /// state.
    async fn call_gateway(&self, state: &EngineContext, charge: &Charge) -> GatewayOutcome {
        let request = build_gateway_request(self.operation_type(), charge);
        invoke_gateway(state, charge, request).await
    }

    /// Maps the outcome to a status, persists it and emits the result
    /// metric. Runs even when phase 2 produced a gateway error, so the
    /// charge is never left stuck in a locked-for-processing status.
    async fn post_operation(
        &self,
        state: &EngineContext,
        charge: Charge,
        outcome: &GatewayOutcome,
    ) -> OperationResult<Charge> {
        persist_outcome(state, self.operation_type(), charge, outcome).await
    }
}

/// Drives an operation through its three phases.
///
/// A phase-1 conflict aborts before any gateway call is made: the gateway
/// must never be invoked for work that could not be exclusively claimed.
#[instrument(skip(state, operation), fields(operation = %operation.operation_type()))]
pub async fn execute_charge_operation(
    state: &EngineContext,
    operation: &dyn ChargeOperation,
    charge_external_id: &str,
) -> OperationResult<ChargeOperationResult> {
    let operation_type = operation.operation_type();

    let charge = state
        .repository
        .lock_charge_for_processing(charge_external_id, operation_type)
        .await
        .map_err(ConflictErrorExt::to_operation_error)?;
    tracing::info!(
        charge_id = %charge.external_id,
        status = %charge.status,
        "charge locked for processing"
    );

    let charge = operation.pre_operation(state, charge).await?;
    let outcome = operation.call_gateway(state, &charge).await;
    let charge = operation.post_operation(state, charge, &outcome).await?;

    Ok(ChargeOperationResult { charge, outcome })
}

pub(crate) fn build_gateway_request(
    operation: OperationType,
    charge: &Charge,
) -> GatewayRequest {
    GatewayRequest {
        operation,
        charge_external_id: charge.external_id.clone(),
        gateway_transaction_id: charge.gateway_transaction_id.clone(),
        amount: charge.total_amount(),
        card_brand: charge.card_brand,
        three_ds_result: None,
    }
}

pub(crate) async fn invoke_gateway(
    state: &EngineContext,
    charge: &Charge,
    request: GatewayRequest,
) -> GatewayOutcome {
    match state
        .gateway
        .invoke(&charge.gateway_account.gateway_name, request)
        .await
    {
        Ok(response) => GatewayOutcome::Response(response),
        Err(report) => {
            let error = report.current_context().clone();
            tracing::warn!(
                charge_id = %charge.external_id,
                gateway = %charge.gateway_account.gateway_name,
                %error,
                "gateway invocation failed"
            );
            GatewayOutcome::Error(error)
        }
    }
}

pub(crate) async fn persist_outcome(
    state: &EngineContext,
    operation: OperationType,
    mut charge: Charge,
    outcome: &GatewayOutcome,
) -> OperationResult<Charge> {
    if let GatewayOutcome::Response(response) = outcome {
        if charge.gateway_transaction_id.is_none() {
            charge.gateway_transaction_id = response.transaction_id.clone();
        }
        if let Some(params) = &response.three_ds_params {
            charge.three_ds_params = Some(params.clone());
        }
    }

    let status = state_machine::map_gateway_outcome_to_status(operation, outcome);
    let persisted = state
        .repository
        .persist(&charge, status)
        .await
        .map_err(StorageErrorExt::to_operation_error)?;

    state.observability.increment_counter(
        metrics::GATEWAY_OPERATION_RESULT,
        &metrics::operation_result_tags(&persisted, operation, status),
    );
    tracing::info!(
        charge_id = %persisted.external_id,
        operation = %operation,
        status = %status,
        "gateway outcome persisted"
    );
    Ok(persisted)
}
