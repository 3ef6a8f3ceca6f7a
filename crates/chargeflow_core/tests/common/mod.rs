#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use charge_models::{
    charge::{CardBrand, GatewayAccount, ProviderKind},
    Charge, ChargeStatus,
};
use chargeflow_core::EngineContext;
use chargeflow_interfaces::mocks::{
    MockCaptureQueue, MockChargeStore, MockGateway, MockNotifier, MockObservability,
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

    pub fn seed_charge(&self, external_id: &str, status: ChargeStatus) -> Charge {
        self.seed_charge_with(external_id, status, live_account(), CardBrand::Visa)
    }

    pub fn seed_charge_with(
        &self,
        external_id: &str,
        status: ChargeStatus,
        account: GatewayAccount,
        card_brand: CardBrand,
    ) -> Charge {
        let id = NEXT_CHARGE_ID.fetch_add(1, Ordering::Relaxed);
        let mut charge = Charge::new(id, external_id, account, card_brand, 10_000);
        if status != ChargeStatus::Created {
            charge.transition(status);
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
        corporate_surcharge: Some(250),
    }
}

pub fn sandbox_account() -> GatewayAccount {
    GatewayAccount {
        id: 7,
        gateway_name: "sandbox".to_string(),
        provider_kind: ProviderKind::Sandbox,
        requires_3ds: false,
        corporate_surcharge: None,
    }
}

pub fn three_ds_account() -> GatewayAccount {
    GatewayAccount {
        id: 42,
        gateway_name: "worldpay".to_string(),
        provider_kind: ProviderKind::Live,
        requires_3ds: true,
        corporate_surcharge: None,
    }
}
