use async_trait::async_trait;
use charge_models::{Charge, ChargeStatus, OperationType};
use error_stack::report;

use crate::{
    errors::{OperationError, OperationResult, StorageErrorExt},
    metrics,
    operations::ChargeOperation,
    EngineContext,
};

/// First authorisation attempt against the gateway.
#[derive(Debug)]
pub struct AuthoriseOperation;

#[async_trait]
impl ChargeOperation for AuthoriseOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::Authorisation
    }

    async fn pre_operation(
        &self,
        state: &EngineContext,
        mut charge: Charge,
    ) -> OperationResult<Charge> {
        // Fail closed: an account that requires 3DS for a brand the card
        // cannot do 3DS with must never reach the gateway. The charge is
        // aborted explicitly rather than left ambiguous.
        if charge.gateway_account.requires_3ds && !charge.card_brand.supports_3ds() {
            let aborted = state
                .repository
                .persist(&charge, ChargeStatus::AuthorisationAborted)
                .await
                .map_err(StorageErrorExt::to_operation_error)?;
            state.observability.increment_counter(
                metrics::CONFIGURATION_MISMATCH_ABORTS,
                &metrics::charge_tags(&aborted),
            );
            tracing::error!(
                charge_id = %aborted.external_id,
                card_brand = %aborted.card_brand,
                "gateway account requires 3DS for a brand without 3DS support; charge aborted"
            );
            return Err(report!(OperationError::ConfigurationMismatch {
                charge_external_id: aborted.external_id,
                card_brand: charge.card_brand,
            }));
        }

        if charge.gateway_transaction_id.is_none() {
            charge.gateway_transaction_id = state.gateway.generate_transaction_id();
        }
        if charge.corporate_card && charge.corporate_surcharge.is_none() {
            charge.corporate_surcharge = charge.gateway_account.corporate_surcharge;
        }
        Ok(charge)
    }
}
