//! Collaborator interfaces consumed by the chargeflow engine.
//!
//! Concrete wire formats, storage engines and queue transports are owned
//! elsewhere; this crate defines the seams plus in-memory implementations
//! backing the integration tests.

pub mod errors;
pub mod mocks;

use std::time::Duration;

use async_trait::async_trait;
use charge_models::{
    errors::{ConflictError, CustomResult, StorageError},
    Charge, ChargeStatus, GatewayError, GatewayRequest, GatewayResponse, OperationType,
};
use serde::{Deserialize, Serialize};

use crate::errors::{NotificationError, QueueError};

/// External-queue envelope carrying a charge's external id plus
/// queue-native metadata. The delivery count is maintained by the transport,
/// not by this core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureWorkMessage {
    pub charge_external_id: String,
    pub message_id: String,
    pub receipt_handle: String,
    pub delivery_count: u32,
}

/// Row-locking charge repository.
///
/// "Locking" is a single optimistic compare-and-swap at write time, never a
/// held lock: `lock_charge_for_processing` must atomically validate the
/// legal-source rule and claim the operation's processing status, and
/// `persist` must fail with [`StorageError::OptimisticLock`] when the
/// charge's version no longer matches storage.
#[async_trait]
pub trait ChargeRepositoryInterface: Send + Sync {
    async fn lock_charge_for_processing(
        &self,
        charge_external_id: &str,
        operation: OperationType,
    ) -> CustomResult<Charge, ConflictError>;

    /// Persists the charge with `new_status`, appending the matching charge
    /// event and incrementing the version.
    async fn persist(
        &self,
        charge: &Charge,
        new_status: ChargeStatus,
    ) -> CustomResult<Charge, StorageError>;

    async fn find_by_external_id(
        &self,
        charge_external_id: &str,
    ) -> CustomResult<Option<Charge>, StorageError>;
}

/// Gateway adapter seam. The only network-bound collaborator in this core.
#[async_trait]
pub trait GatewayInterface: Send + Sync {
    async fn invoke(
        &self,
        provider_name: &str,
        request: GatewayRequest,
    ) -> CustomResult<GatewayResponse, GatewayError>;

    /// Some providers want the transaction id minted by the caller before
    /// the first request; adapters for the rest return `None`.
    fn generate_transaction_id(&self) -> Option<String>;
}

#[async_trait]
pub trait CaptureQueueInterface: Send + Sync {
    async fn receive(
        &self,
        batch_size: usize,
    ) -> CustomResult<Vec<CaptureWorkMessage>, QueueError>;

    /// Removes the message from the queue.
    async fn acknowledge(&self, message: &CaptureWorkMessage) -> CustomResult<(), QueueError>;

    /// Re-submits the message with a visibility delay, after which it
    /// becomes deliverable again.
    async fn schedule_retry(
        &self,
        message: &CaptureWorkMessage,
        delay: Duration,
    ) -> CustomResult<(), QueueError>;

    /// Produces a capture-work message for a charge that became eligible
    /// for capture.
    async fn publish(&self, charge_external_id: &str) -> CustomResult<(), QueueError>;
}

/// Counters and histograms, injected by parameter rather than read from an
/// ambient registry. Structured logs go through `tracing` directly.
pub trait ObservabilityInterface: Send + Sync {
    fn increment_counter(&self, name: &'static str, tags: &[(&'static str, String)]);
    fn record_histogram(&self, name: &'static str, value: f64);
}

#[async_trait]
pub trait NotificationInterface: Send + Sync {
    /// Invoked on capture success only.
    async fn notify_payment_confirmed(
        &self,
        charge: &Charge,
    ) -> CustomResult<(), NotificationError>;
}
