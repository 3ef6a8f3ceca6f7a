//! In-memory collaborator implementations backing the integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use charge_models::{
    errors::{ConflictError, CustomResult, StorageError},
    gateway::GatewayOutcomeStatus,
    state_machine, Charge, ChargeStatus, GatewayError, GatewayRequest, GatewayResponse,
    OperationType,
};
use error_stack::report;

use crate::{
    errors::{NotificationError, QueueError},
    CaptureQueueInterface, CaptureWorkMessage, ChargeRepositoryInterface, GatewayInterface,
    NotificationInterface, ObservabilityInterface,
};

/// Charge store with compare-and-swap writes on the charge version. The
/// whole map sits behind one mutex, which makes lock-and-claim atomic the
/// way a row-locking store would.
#[derive(Debug, Default)]
pub struct MockChargeStore {
    charges: Mutex<HashMap<String, Charge>>,
}

impl MockChargeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_charge(&self, charge: Charge) {
        self.charges
            .lock()
            .expect("charge store poisoned")
            .insert(charge.external_id.clone(), charge);
    }
}

#[async_trait]
impl ChargeRepositoryInterface for MockChargeStore {
    async fn lock_charge_for_processing(
        &self,
        charge_external_id: &str,
        operation: OperationType,
    ) -> CustomResult<Charge, ConflictError> {
        let mut charges = self.charges.lock().expect("charge store poisoned");
        let charge = charges.get_mut(charge_external_id).ok_or_else(|| {
            report!(ConflictError::ChargeNotFound {
                charge_external_id: charge_external_id.to_string(),
            })
        })?;

        if !state_machine::is_legal_source(charge.status, operation) {
            return Err(report!(ConflictError::IllegalTransition {
                charge_external_id: charge_external_id.to_string(),
                from: charge.status,
                operation,
            }));
        }

        charge.transition(state_machine::processing_status(operation));
        charge.version += 1;
        Ok(charge.clone())
    }

    async fn persist(
        &self,
        charge: &Charge,
        new_status: ChargeStatus,
    ) -> CustomResult<Charge, StorageError> {
        let mut charges = self.charges.lock().expect("charge store poisoned");
        let stored = charges.get_mut(&charge.external_id).ok_or_else(|| {
            report!(StorageError::ValueNotFound(charge.external_id.clone()))
        })?;

        if stored.version != charge.version {
            return Err(report!(StorageError::OptimisticLock {
                charge_external_id: charge.external_id.clone(),
            }));
        }

        let mut updated = charge.clone();
        updated.transition(new_status);
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn find_by_external_id(
        &self,
        charge_external_id: &str,
    ) -> CustomResult<Option<Charge>, StorageError> {
        Ok(self
            .charges
            .lock()
            .expect("charge store poisoned")
            .get(charge_external_id)
            .cloned())
    }
}

/// Gateway adapter with a scripted response queue. When the script is
/// empty, authorisations succeed and captures report submitted, so happy
/// path tests need no setup.
#[derive(Debug, Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<GatewayResponse, GatewayError>>>,
    invocations: Mutex<Vec<GatewayRequest>>,
    latency: Mutex<Option<Duration>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: Result<GatewayResponse, GatewayError>) {
        self.responses
            .lock()
            .expect("gateway script poisoned")
            .push_back(response);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().expect("gateway latency poisoned") = Some(latency);
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().expect("invocations poisoned").len()
    }

    pub fn last_request(&self) -> Option<GatewayRequest> {
        self.invocations
            .lock()
            .expect("invocations poisoned")
            .last()
            .cloned()
    }

    fn default_response(operation: OperationType) -> GatewayResponse {
        let status = match operation {
            OperationType::Authorisation | OperationType::Authorisation3ds => {
                GatewayOutcomeStatus::Authorised
            }
            OperationType::Capture => GatewayOutcomeStatus::CaptureSubmitted,
        };
        GatewayResponse {
            status,
            transaction_id: Some(format!("mock-gw-{}", uuid::Uuid::new_v4())),
            three_ds_params: None,
        }
    }
}

#[async_trait]
impl GatewayInterface for MockGateway {
    async fn invoke(
        &self,
        _provider_name: &str,
        request: GatewayRequest,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        let operation = request.operation;
        self.invocations
            .lock()
            .expect("invocations poisoned")
            .push(request);

        let latency = *self.latency.lock().expect("gateway latency poisoned");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .responses
            .lock()
            .expect("gateway script poisoned")
            .pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(report!(error)),
            None => Ok(Self::default_response(operation)),
        }
    }

    fn generate_transaction_id(&self) -> Option<String> {
        Some(format!("txn-{}", uuid::Uuid::new_v4()))
    }
}

#[derive(Debug, Default)]
pub struct MockCaptureQueue {
    pending: Mutex<VecDeque<CaptureWorkMessage>>,
    published: Mutex<Vec<String>>,
    acknowledged: Mutex<Vec<String>>,
    retried: Mutex<Vec<(String, Duration)>>,
}

impl MockCaptureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_message(&self, message: CaptureWorkMessage) {
        self.pending
            .lock()
            .expect("queue poisoned")
            .push_back(message);
    }

    pub fn published_charges(&self) -> Vec<String> {
        self.published.lock().expect("queue poisoned").clone()
    }

    pub fn acknowledged_messages(&self) -> Vec<String> {
        self.acknowledged.lock().expect("queue poisoned").clone()
    }

    pub fn retried_messages(&self) -> Vec<(String, Duration)> {
        self.retried.lock().expect("queue poisoned").clone()
    }
}

#[async_trait]
impl CaptureQueueInterface for MockCaptureQueue {
    async fn receive(
        &self,
        batch_size: usize,
    ) -> CustomResult<Vec<CaptureWorkMessage>, QueueError> {
        let mut pending = self.pending.lock().expect("queue poisoned");
        let take = batch_size.min(pending.len());
        Ok(pending.drain(..take).collect())
    }

    async fn acknowledge(&self, message: &CaptureWorkMessage) -> CustomResult<(), QueueError> {
        self.acknowledged
            .lock()
            .expect("queue poisoned")
            .push(message.message_id.clone());
        Ok(())
    }

    async fn schedule_retry(
        &self,
        message: &CaptureWorkMessage,
        delay: Duration,
    ) -> CustomResult<(), QueueError> {
        self.retried
            .lock()
            .expect("queue poisoned")
            .push((message.message_id.clone(), delay));
        Ok(())
    }

    async fn publish(&self, charge_external_id: &str) -> CustomResult<(), QueueError> {
        self.published
            .lock()
            .expect("queue poisoned")
            .push(charge_external_id.to_string());
        self.pending
            .lock()
            .expect("queue poisoned")
            .push_back(CaptureWorkMessage {
                charge_external_id: charge_external_id.to_string(),
                message_id: uuid::Uuid::new_v4().to_string(),
                receipt_handle: uuid::Uuid::new_v4().to_string(),
                delivery_count: 1,
            });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockObservability {
    counters: Mutex<Vec<(&'static str, Vec<(&'static str, String)>)>>,
    histograms: Mutex<Vec<(&'static str, f64)>>,
}

impl MockObservability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter_total(&self, name: &'static str) -> usize {
        self.counters
            .lock()
            .expect("counters poisoned")
            .iter()
            .filter(|(recorded, _)| *recorded == name)
            .count()
    }

    pub fn counter_tags(&self, name: &'static str) -> Vec<Vec<(&'static str, String)>> {
        self.counters
            .lock()
            .expect("counters poisoned")
            .iter()
            .filter(|(recorded, _)| *recorded == name)
            .map(|(_, tags)| tags.clone())
            .collect()
    }

    pub fn histogram_values(&self, name: &'static str) -> Vec<f64> {
        self.histograms
            .lock()
            .expect("histograms poisoned")
            .iter()
            .filter(|(recorded, _)| *recorded == name)
            .map(|(_, value)| *value)
            .collect()
    }
}

impl ObservabilityInterface for MockObservability {
    fn increment_counter(&self, name: &'static str, tags: &[(&'static str, String)]) {
        self.counters
            .lock()
            .expect("counters poisoned")
            .push((name, tags.to_vec()));
    }

    fn record_histogram(&self, name: &'static str, value: f64) {
        self.histograms
            .lock()
            .expect("histograms poisoned")
            .push((name, value));
    }
}

#[derive(Debug, Default)]
pub struct MockNotifier {
    confirmed: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed_charges(&self) -> Vec<String> {
        self.confirmed.lock().expect("notifier poisoned").clone()
    }
}

#[async_trait]
impl NotificationInterface for MockNotifier {
    async fn notify_payment_confirmed(
        &self,
        charge: &Charge,
    ) -> CustomResult<(), NotificationError> {
        self.confirmed
            .lock()
            .expect("notifier poisoned")
            .push(charge.external_id.clone());
        Ok(())
    }
}
