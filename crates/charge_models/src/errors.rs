//! Errors and error specific types for universal use.

use crate::state_machine::{ChargeStatus, OperationType};

/// A custom datatype that wraps the error variant `<E>` into a report,
/// allowing `error_stack::Report<E>` specific extendability.
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Storage races and illegal state-machine transitions, surfaced as typed
/// outcomes instead of stack unwinding. The two variants demand different
/// remedies: an optimistic-lock loss means "retry", an illegal transition
/// means "this charge is not eligible for this operation at all".
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConflictError {
    #[error("charge {charge_external_id} was updated concurrently")]
    OptimisticLock { charge_external_id: String },
    #[error("charge {charge_external_id} in status {from} is not a legal source for {operation}")]
    IllegalTransition {
        charge_external_id: String,
        from: ChargeStatus,
        operation: OperationType,
    },
    #[error("charge {charge_external_id} not found")]
    ChargeNotFound { charge_external_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("optimistic lock lost for charge {charge_external_id}")]
    OptimisticLock { charge_external_id: String },
    #[error("value not found: {0}")]
    ValueNotFound(String),
    #[error("storage unavailable")]
    ConnectionError,
    #[error("serialization failure")]
    SerializationFailed,
}

impl StorageError {
    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, Self::OptimisticLock { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("invalid configuration value: {0}")]
    InvalidConfigurationValueError(String),
}
