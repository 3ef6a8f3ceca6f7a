#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use capture_queue::{consumer::CaptureConsumer, settings::CaptureSettings};
use charge_models::{
    charge::{CardBrand, GatewayAccount, ProviderKind},
    Charge, ChargeStatus,
};
use chargeflow_core::{executor::GatewayExecutor, settings::ExecutorSettings, EngineContext};
use chargeflow_interfaces::{
    mocks::{MockCaptureQueue, MockChargeStore, MockGateway, MockNotifier, MockObservability},
    CaptureWorkMessage,
};

static NEXT_CHARGE_ID: AtomicI64 = AtomicI64::new(1);

pub struct TestHarness {
    pub store: Arc<MockChargeStore>,
    pub gateway: Arc<MockGateway>,
    pub queue: Arc<MockCaptureQueue>,
    pub observability: Arc<MockObservability>,
    pub notifier: Arc<MockNotifier>,
    pub state: EngineContext,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(MockChargeStore::new());
        let gateway = Arc::new(MockGateway::new());
        let queue = Arc::new(MockCaptureQueue::new());
        let observability = Arc::new(MockObservability::new());
        let notifier = Arc::new(MockNotifier::new());

        let state = EngineContext {
            repository: store.clone(),
            gateway: gateway.clone(),
            queue: queue.clone(),
            observability: observability.clone(),
            notifier: notifier.clone(),
        };

        Self {
            store,
            gateway,
            queue,
            observability,
            notifier,
            state,
        }
    }

    /// Must be called from within a tokio runtime: the executor spawns its
    /// workers eagerly.
    pub fn consumer(&self, capture_budget: Duration, settings: CaptureSettings) -> CaptureConsumer {
        let executor = Arc::new(GatewayExecutor::new(
            &ExecutorSettings::default(),
            self.observability.clone(),
        ));
        CaptureConsumer::new(self.state.clone(), executor, capture_budget, settings)
    }

    pub fn seed_charge(&self, external_id: &str, status: ChargeStatus) -> Charge {
        let id = NEXT_CHARGE_ID.fetch_add(1, Ordering::Relaxed);
        let mut charge = Charge::new(id, external_id, live_account(), CardBrand::Visa, 10_000);
        if status != ChargeStatus::Created {
            charge.transition(status);
        }
        self.store.insert_charge(charge.clone());
        charge
    }

    /// Seeds a retriable charge whose event history already records
    /// `prior_retries` failed capture attempts.
    pub fn seed_retried_charge(&self, external_id: &str, prior_retries: usize) -> Charge {
        let id = NEXT_CHARGE_ID.fetch_add(1, Ordering::Relaxed);
        let mut charge = Charge::new(id, external_id, live_account(), CardBrand::Visa, 10_000);
        charge.transition(ChargeStatus::AuthorisationSuccess);
        charge.transition(ChargeStatus::CaptureApproved);
        for _ in 0..prior_retries {
            charge.transition(ChargeStatus::CaptureReady);
            charge.transition(ChargeStatus::CaptureApprovedRetry);
        }
        self.store.insert_charge(charge.clone());
        charge
    }
}

pub fn live_account() -> GatewayAccount {
    GatewayAccount {
        id: 42,
        gateway_name: "worldpay".to_string(),
        provider_kind: ProviderKind::Live,
        requires_3ds: false,
        corporate_surcharge: None,
    }
}

pub fn work_message(charge_external_id: &str) -> CaptureWorkMessage {
    CaptureWorkMessage {
        charge_external_id: charge_external_id.to_string(),
        message_id: uuid::Uuid::new_v4().to_string(),
        receipt_handle: uuid::Uuid::new_v4().to_string(),
        delivery_count: 1,
    }
}
