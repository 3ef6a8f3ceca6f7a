//! Authorisation and capture orchestration engine.
//!
//! The pieces fit together as follows: an inbound request (REST layer or the
//! capture queue processor) submits a unit of work to the
//! [`executor::GatewayExecutor`]; the work runs an operation through
//! [`operations::execute_charge_operation`], which locks the charge via the
//! repository collaborator, calls the gateway, and persists the mapped
//! status. Races between concurrent attempts on the same charge surface as
//! typed conflicts ([`errors::OperationError::Conflict`]), never as double
//! gateway calls.

pub mod capture_approval;
pub mod errors;
pub mod executor;
pub mod metrics;
pub mod operations;
pub mod settings;

use std::sync::Arc;

use chargeflow_interfaces::{
    CaptureQueueInterface, ChargeRepositoryInterface, GatewayInterface, NotificationInterface,
    ObservabilityInterface,
};

/// Collaborators injected by parameter at construction. No component in this
/// crate reads ambient singletons.
#[derive(Clone)]
pub struct EngineContext {
    pub repository: Arc<dyn ChargeRepositoryInterface>,
    pub gateway: Arc<dyn GatewayInterface>,
    pub queue: Arc<dyn CaptureQueueInterface>,
    pub observability: Arc<dyn ObservabilityInterface>,
    pub notifier: Arc<dyn NotificationInterface>,
}
