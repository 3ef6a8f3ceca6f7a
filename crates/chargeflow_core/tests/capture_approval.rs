#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use charge_models::{errors::ConflictError, ChargeStatus};
use chargeflow_core::{
    capture_approval::{approve_charge_for_capture, release_delayed_capture},
    errors::OperationError,
};
use chargeflow_interfaces::ChargeRepositoryInterface;
use common::TestHarness;

#[tokio::test]
async fn approval_moves_an_authorised_charge_into_the_queue() {
    let harness = TestHarness::new();
    harness.seed_charge("ch-approve", ChargeStatus::AuthorisationSuccess);

    let approved = approve_charge_for_capture(&harness.state, "ch-approve")
        .await
        .unwrap();

    assert_eq!(approved.status, ChargeStatus::CaptureApproved);
    assert_eq!(
        harness.queue.published_charges(),
        vec!["ch-approve".to_string()]
    );
}

#[tokio::test]
async fn approval_is_idempotent_for_charges_already_in_the_pipeline() {
    let harness = TestHarness::new();
    let seeded = harness.seed_charge("ch-approve-dup", ChargeStatus::CaptureSubmitted);

    let unchanged = approve_charge_for_capture(&harness.state, "ch-approve-dup")
        .await
        .unwrap();

    assert_eq!(unchanged.status, ChargeStatus::CaptureSubmitted);
    assert_eq!(unchanged.version, seeded.version);
    assert!(harness.queue.published_charges().is_empty());

    let stored = harness
        .store
        .find_by_external_id("ch-approve-dup")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.version, seeded.version);
}

#[tokio::test]
async fn delayed_capture_parks_until_explicitly_released() {
    let harness = TestHarness::new();
    let mut charge = harness.seed_charge("ch-delayed", ChargeStatus::AuthorisationSuccess);
    charge.delayed_capture = true;
    harness.store.insert_charge(charge);

    let parked = approve_charge_for_capture(&harness.state, "ch-delayed")
        .await
        .unwrap();
    assert_eq!(parked.status, ChargeStatus::AwaitingCaptureRequest);
    assert!(harness.queue.published_charges().is_empty());

    let released = release_delayed_capture(&harness.state, "ch-delayed")
        .await
        .unwrap();
    assert_eq!(released.status, ChargeStatus::CaptureApproved);
    assert_eq!(
        harness.queue.published_charges(),
        vec!["ch-delayed".to_string()]
    );
}

#[tokio::test]
async fn approval_rejects_charges_that_never_authorised() {
    let harness = TestHarness::new();
    harness.seed_charge("ch-unauthorised", ChargeStatus::Created);

    let error = approve_charge_for_capture(&harness.state, "ch-unauthorised")
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        OperationError::Conflict(ConflictError::IllegalTransition { .. })
    ));
    assert!(harness.queue.published_charges().is_empty());
}

#[tokio::test]
async fn release_rejects_charges_not_awaiting_a_capture_request() {
    let harness = TestHarness::new();
    harness.seed_charge("ch-not-parked", ChargeStatus::AuthorisationSuccess);

    let error = release_delayed_capture(&harness.state, "ch-not-parked")
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        OperationError::Conflict(ConflictError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn unknown_charge_surfaces_as_a_not_found_conflict() {
    let harness = TestHarness::new();

    let error = approve_charge_for_capture(&harness.state, "ch-missing")
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        OperationError::Conflict(ConflictError::ChargeNotFound { .. })
    ));
}
