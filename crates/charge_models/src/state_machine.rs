//! Charge lifecycle state machine.
//!
//! Legal transitions are expressed as legal *source* sets per operation kind
//! rather than a full transition table: the only writers of a charge are the
//! three gateway operations plus capture approval, and each of them claims a
//! single processing status before doing anything else.

use serde::{Deserialize, Serialize};

use crate::{
    charge::Charge,
    gateway::{GatewayError, GatewayOutcome, GatewayOutcomeStatus},
};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChargeStatus {
    Created,
    EnteringCardDetails,
    AuthorisationReady,
    Authorisation3dsRequired,
    Authorisation3dsReady,
    AuthorisationSuccess,
    AuthorisationRejected,
    AuthorisationError,
    AuthorisationTimeout,
    AuthorisationUnexpectedError,
    AuthorisationAborted,
    AwaitingCaptureRequest,
    CaptureApproved,
    CaptureApprovedRetry,
    CaptureReady,
    CaptureSubmitted,
    Captured,
    CaptureError,
    Expired,
    UserCancelled,
}

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
pub enum OperationType {
    Authorisation,
    Authorisation3ds,
    Capture,
}

/// Statuses from which the given operation may start. Anything else is a
/// conflict, never a silent no-op.
///
/// The locked-for-processing statuses are deliberately absent: a charge
/// already claimed by one attempt must conflict with every concurrent
/// attempt, which is what keeps the gateway from being called twice.
pub fn legal_sources(operation: OperationType) -> &'static [ChargeStatus] {
    match operation {
        OperationType::Authorisation => &[
            ChargeStatus::Created,
            ChargeStatus::EnteringCardDetails,
        ],
        OperationType::Authorisation3ds => &[ChargeStatus::Authorisation3dsRequired],
        OperationType::Capture => &[
            ChargeStatus::CaptureApproved,
            ChargeStatus::CaptureApprovedRetry,
        ],
    }
}

pub fn is_legal_source(status: ChargeStatus, operation: OperationType) -> bool {
    legal_sources(operation).contains(&status)
}

/// The locked-for-processing status an operation moves the charge to before
/// any gateway call is made.
pub fn processing_status(operation: OperationType) -> ChargeStatus {
    match operation {
        OperationType::Authorisation => ChargeStatus::AuthorisationReady,
        OperationType::Authorisation3ds => ChargeStatus::Authorisation3dsReady,
        OperationType::Capture => ChargeStatus::CaptureReady,
    }
}

/// Translates a gateway outcome into the charge status to persist.
///
/// Total over every outcome kind by construction: adding a variant to
/// [`GatewayOutcomeStatus`] or [`GatewayError`] fails compilation here until
/// a mapping is chosen.
///
/// Capture-side timeouts and unexpected errors map to the retriable
/// `CaptureApprovedRetry`; the queue processor's poison exit is the only
/// path to the terminal `CaptureError` from a transient failure, which keeps
/// the retry budget enforceable in one place.
pub fn map_gateway_outcome_to_status(
    operation: OperationType,
    outcome: &GatewayOutcome,
) -> ChargeStatus {
    match outcome {
        GatewayOutcome::Response(response) => match response.status {
            GatewayOutcomeStatus::Authorised => ChargeStatus::AuthorisationSuccess,
            GatewayOutcomeStatus::Rejected => ChargeStatus::AuthorisationRejected,
            GatewayOutcomeStatus::ThreeDsRequired => ChargeStatus::Authorisation3dsRequired,
            GatewayOutcomeStatus::CaptureSubmitted => ChargeStatus::CaptureSubmitted,
            GatewayOutcomeStatus::Captured => ChargeStatus::Captured,
        },
        GatewayOutcome::Error(error) => match (operation, error) {
            (OperationType::Capture, GatewayError::Generic(_)) => ChargeStatus::CaptureError,
            (OperationType::Capture, GatewayError::ConnectionTimeout)
            | (OperationType::Capture, GatewayError::Unexpected(_)) => {
                ChargeStatus::CaptureApprovedRetry
            }
            (_, GatewayError::Generic(_)) => ChargeStatus::AuthorisationError,
            (_, GatewayError::ConnectionTimeout) => ChargeStatus::AuthorisationTimeout,
            (_, GatewayError::Unexpected(_)) => ChargeStatus::AuthorisationUnexpectedError,
        },
    }
}

/// Status a successfully authorised charge moves to when approved for
/// capture. Delayed-capture charges park in `AwaitingCaptureRequest` until a
/// separate merchant action releases them, so delayed captures never re-run
/// authorisation.
pub fn next_capture_approval_status(charge: &Charge) -> ChargeStatus {
    if charge.delayed_capture {
        ChargeStatus::AwaitingCaptureRequest
    } else {
        ChargeStatus::CaptureApproved
    }
}

/// Charges in these statuses are already in the capture pipeline or done;
/// re-approving one is an idempotent no-op.
pub fn is_capture_in_flight_or_done(status: ChargeStatus) -> bool {
    matches!(
        status,
        ChargeStatus::CaptureApproved
            | ChargeStatus::CaptureApprovedRetry
            | ChargeStatus::CaptureReady
            | ChargeStatus::CaptureSubmitted
            | ChargeStatus::Captured
    )
}

pub fn is_terminal(status: ChargeStatus) -> bool {
    matches!(
        status,
        ChargeStatus::Captured
            | ChargeStatus::CaptureError
            | ChargeStatus::AuthorisationRejected
            | ChargeStatus::AuthorisationAborted
            | ChargeStatus::Expired
            | ChargeStatus::UserCancelled
    )
}
