use charge_models::{
    charge::CardBrand,
    errors::{ConflictError, StorageError},
};
pub use charge_models::errors::CustomResult;

pub type OperationResult<T> = CustomResult<T, OperationError>;

/// Error taxonomy of the orchestration template. Conflicts and gateway
/// errors are recovered inside the template (mapped to a persisted status);
/// only configuration-mismatch and capacity conditions reach the immediate
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("conflict: {0}")]
    Conflict(ConflictError),
    #[error("an identical operation is already in progress for this charge")]
    AlreadyInProgress,
    #[error(
        "gateway account requires 3-D Secure but card brand {card_brand} does not support it"
    )]
    ConfigurationMismatch {
        charge_external_id: String,
        card_brand: CardBrand,
    },
    #[error("storage failure during operation")]
    Storage,
    #[error("queue failure during operation")]
    Queue,
    #[error("internal error")]
    Internal,
}

pub trait StorageErrorExt {
    /// Optimistic-lock losses become typed conflicts; everything else is a
    /// storage failure.
    fn to_operation_error(self) -> error_stack::Report<OperationError>;
}

impl StorageErrorExt for error_stack::Report<StorageError> {
    fn to_operation_error(self) -> error_stack::Report<OperationError> {
        match self.current_context() {
            StorageError::OptimisticLock {
                charge_external_id,
            } => {
                let conflict = ConflictError::OptimisticLock {
                    charge_external_id: charge_external_id.clone(),
                };
                self.change_context(OperationError::Conflict(conflict))
            }
            _ => self.change_context(OperationError::Storage),
        }
    }
}

pub trait ConflictErrorExt {
    fn to_operation_error(self) -> error_stack::Report<OperationError>;
}

impl ConflictErrorExt for error_stack::Report<ConflictError> {
    fn to_operation_error(self) -> error_stack::Report<OperationError> {
        let conflict = self.current_context().clone();
        self.change_context(OperationError::Conflict(conflict))
    }
}
