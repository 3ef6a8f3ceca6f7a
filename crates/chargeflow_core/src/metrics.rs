//! Metric names and tag builders, emitted through the injected
//! [`chargeflow_interfaces::ObservabilityInterface`].

use charge_models::{Charge, ChargeStatus, OperationType};

/// Result of a gateway operation, keyed by gateway/account/operation/result.
pub const GATEWAY_OPERATION_RESULT: &str = "gateway_operation_result_total";
/// Time work spends queued before a worker picks it up.
pub const EXECUTOR_QUEUE_WAIT_MS: &str = "executor_queue_wait_milliseconds";
/// Work rejected because the intake channel stayed full past the budget.
pub const EXECUTOR_REJECTED_WORK: &str = "executor_rejected_work_total";
/// Charges that hit the poison exit of the capture pipeline.
pub const CAPTURE_RETRIES_EXHAUSTED: &str = "capture_retries_exhausted_total";
/// Charges aborted because the account's 3DS requirement cannot be met.
pub const CONFIGURATION_MISMATCH_ABORTS: &str = "configuration_mismatch_aborts_total";

pub fn operation_result_tags(
    charge: &Charge,
    operation: OperationType,
    result: ChargeStatus,
) -> Vec<(&'static str, String)> {
    vec![
        ("gateway", charge.gateway_account.gateway_name.clone()),
        ("gateway_account", charge.gateway_account.id.to_string()),
        ("operation", operation.to_string()),
        ("result", result.to_string()),
    ]
}

pub fn charge_tags(charge: &Charge) -> Vec<(&'static str, String)> {
    vec![
        ("gateway", charge.gateway_account.gateway_name.clone()),
        ("gateway_account", charge.gateway_account.id.to_string()),
    ]
}
