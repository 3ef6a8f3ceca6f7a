//! The charge aggregate and its append-only event log.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state_machine::ChargeStatus;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Maestro,
    AmericanExpress,
    DinersClub,
    Discover,
    Jcb,
}

impl CardBrand {
    /// Whether the brand participates in 3-D Secure. Accounts that require
    /// 3DS must reject brands outside this set before any gateway call.
    pub fn supports_3ds(self) -> bool {
        matches!(self, Self::Visa | Self::Mastercard | Self::Maestro)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    Live,
    /// Test providers settle nothing externally, so no asynchronous
    /// settlement notification will ever arrive for them.
    Sandbox,
}

/// Merchant/provider configuration. Read-only from this core's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayAccount {
    pub id: i64,
    pub gateway_name: String,
    pub provider_kind: ProviderKind,
    pub requires_3ds: bool,
    /// Surcharge in minor units applied to corporate cards, if configured.
    pub corporate_surcharge: Option<i64>,
}

/// One entry per status transition. The log is never mutated or deleted,
/// only appended; a charge's status always equals the status of its most
/// recent event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeEvent {
    pub status: ChargeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Internal storage key.
    pub id: i64,
    /// Externally visible opaque id. Never reused, never guessable.
    pub external_id: String,
    pub status: ChargeStatus,
    /// Optimistic concurrency counter. Every persisted mutation increments
    /// it; a write fails if the version read no longer matches storage.
    pub version: i64,
    pub gateway_transaction_id: Option<String>,
    pub gateway_account: GatewayAccount,
    pub delayed_capture: bool,
    pub card_brand: CardBrand,
    pub corporate_card: bool,
    /// Amount in minor units, excluding any surcharge.
    pub amount: i64,
    /// Corporate-card surcharge, computed exactly once per authorisation
    /// attempt.
    pub corporate_surcharge: Option<i64>,
    pub three_ds_params: Option<crate::gateway::ThreeDsParams>,
    pub events: Vec<ChargeEvent>,
}

impl Charge {
    pub fn new(
        id: i64,
        external_id: impl Into<String>,
        gateway_account: GatewayAccount,
        card_brand: CardBrand,
        amount: i64,
    ) -> Self {
        let created_at = OffsetDateTime::now_utc();
        Self {
            id,
            external_id: external_id.into(),
            status: ChargeStatus::Created,
            version: 1,
            gateway_transaction_id: None,
            gateway_account,
            delayed_capture: false,
            card_brand,
            corporate_card: false,
            amount,
            corporate_surcharge: None,
            three_ds_params: None,
            events: vec![ChargeEvent {
                status: ChargeStatus::Created,
                occurred_at: created_at,
            }],
        }
    }

    /// Applies a status transition in memory, appending the matching event.
    /// Version increments happen at persist time, not here.
    pub fn transition(&mut self, status: ChargeStatus) {
        self.status = status;
        self.events.push(ChargeEvent {
            status,
            occurred_at: OffsetDateTime::now_utc(),
        });
    }

    pub fn total_amount(&self) -> i64 {
        self.amount + self.corporate_surcharge.unwrap_or(0)
    }

    /// Number of capture retries already recorded against this charge,
    /// derived from the event history rather than a mutable counter so that
    /// replays and crashes cannot under-count.
    pub fn capture_retry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.status == ChargeStatus::CaptureApprovedRetry)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> GatewayAccount {
        GatewayAccount {
            id: 7,
            gateway_name: "worldpay".to_string(),
            provider_kind: ProviderKind::Live,
            requires_3ds: false,
            corporate_surcharge: Some(250),
        }
    }

    #[test]
    fn status_always_matches_most_recent_event() {
        let mut charge = Charge::new(1, "ch-abc", account(), CardBrand::Visa, 10_000);
        charge.transition(ChargeStatus::EnteringCardDetails);
        charge.transition(ChargeStatus::AuthorisationReady);
        charge.transition(ChargeStatus::AuthorisationSuccess);

        assert_eq!(charge.events.len(), 4);
        assert_eq!(
            charge.events.last().map(|event| event.status),
            Some(charge.status)
        );
    }

    #[test]
    fn retry_count_counts_only_retry_events() {
        let mut charge = Charge::new(1, "ch-abc", account(), CardBrand::Visa, 10_000);
        charge.transition(ChargeStatus::CaptureApproved);
        charge.transition(ChargeStatus::CaptureReady);
        charge.transition(ChargeStatus::CaptureApprovedRetry);
        charge.transition(ChargeStatus::CaptureReady);
        charge.transition(ChargeStatus::CaptureApprovedRetry);

        assert_eq!(charge.capture_retry_count(), 2);
    }

    #[test]
    fn total_amount_includes_surcharge_when_present() {
        let mut charge = Charge::new(1, "ch-abc", account(), CardBrand::Visa, 10_000);
        assert_eq!(charge.total_amount(), 10_000);
        charge.corporate_surcharge = Some(250);
        assert_eq!(charge.total_amount(), 10_250);
    }
}
