use async_trait::async_trait;
use charge_models::{Charge, GatewayOutcome, OperationType};

use crate::{
    operations::{build_gateway_request, invoke_gateway, ChargeOperation},
    EngineContext,
};

/// Completes an authorisation after the cardholder answered a 3-D Secure
/// challenge. Carries the issuer's response through to the gateway.
#[derive(Debug)]
pub struct Authorise3dsResponseOperation {
    pub three_ds_result: String,
}

#[async_trait]
impl ChargeOperation for Authorise3dsResponseOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::Authorisation3ds
    }

    async fn call_gateway(&self, state: &EngineContext, charge: &Charge) -> GatewayOutcome {
        let mut request = build_gateway_request(self.operation_type(), charge);
        request.three_ds_result = Some(self.three_ds_result.clone());
        invoke_gateway(state, charge, request).await
    }
}
