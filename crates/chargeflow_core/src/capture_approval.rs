//! Capture eligibility transitions: the merchant-facing step that feeds the
//! capture queue.

use charge_models::{
    errors::ConflictError, state_machine, Charge, ChargeStatus, OperationType,
};
use error_stack::{report, ResultExt};
use tracing::instrument;

use crate::{
    errors::{OperationError, OperationResult, StorageErrorExt},
    EngineContext,
};

/// Approves a successfully authorised charge for capture.
///
/// Charges already in the capture pipeline (or captured) are returned
/// unchanged with no write: at-least-once callers may safely repeat this.
/// Delayed-capture charges park in `AwaitingCaptureRequest` and produce no
/// queue message until released.
#[instrument(skip(state))]
pub async fn approve_charge_for_capture(
    state: &EngineContext,
    charge_external_id: &str,
) -> OperationResult<Charge> {
    let charge = find_required_charge(state, charge_external_id).await?;

    if state_machine::is_capture_in_flight_or_done(charge.status) {
        tracing::info!(
            charge_id = %charge.external_id,
            status = %charge.status,
            "capture already in flight or done; approval is a no-op"
        );
        return Ok(charge);
    }
    if charge.status != ChargeStatus::AuthorisationSuccess {
        return Err(report!(OperationError::Conflict(
            ConflictError::IllegalTransition {
                charge_external_id: charge.external_id.clone(),
                from: charge.status,
                operation: OperationType::Capture,
            }
        )));
    }

    let next = state_machine::next_capture_approval_status(&charge);
    let persisted = state
        .repository
        .persist(&charge, next)
        .await
        .map_err(StorageErrorExt::to_operation_error)?;

    if next == ChargeStatus::CaptureApproved {
        publish_capture_work(state, &persisted).await?;
    }
    Ok(persisted)
}

/// Releases a delayed-capture charge: the explicit merchant action that lets
/// delayed captures proceed without re-running authorisation.
#[instrument(skip(state))]
pub async fn release_delayed_capture(
    state: &EngineContext,
    charge_external_id: &str,
) -> OperationResult<Charge> {
    let charge = find_required_charge(state, charge_external_id).await?;

    if state_machine::is_capture_in_flight_or_done(charge.status) {
        return Ok(charge);
    }
    if charge.status != ChargeStatus::AwaitingCaptureRequest {
        return Err(report!(OperationError::Conflict(
            ConflictError::IllegalTransition {
                charge_external_id: charge.external_id.clone(),
                from: charge.status,
                operation: OperationType::Capture,
            }
        )));
    }

    let persisted = state
        .repository
        .persist(&charge, ChargeStatus::CaptureApproved)
        .await
        .map_err(StorageErrorExt::to_operation_error)?;
    publish_capture_work(state, &persisted).await?;
    Ok(persisted)
}

async fn find_required_charge(
    state: &EngineContext,
    charge_external_id: &str,
) -> OperationResult<Charge> {
    state
        .repository
        .find_by_external_id(charge_external_id)
        .await
        .change_context(OperationError::Storage)?
        .ok_or_else(|| {
            report!(OperationError::Conflict(ConflictError::ChargeNotFound {
                charge_external_id: charge_external_id.to_string(),
            }))
        })
}

async fn publish_capture_work(state: &EngineContext, charge: &Charge) -> OperationResult<()> {
    state
        .queue
        .publish(&charge.external_id)
        .await
        .change_context(OperationError::Queue)?;
    tracing::info!(charge_id = %charge.external_id, "capture work published");
    Ok(())
}
