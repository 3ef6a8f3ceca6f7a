//! Typed outcomes of a single gateway invocation.
//!
//! A gateway outcome is never persisted directly; the state machine first
//! translates it into a [`crate::ChargeStatus`].

use serde::{Deserialize, Serialize};

use crate::{charge::CardBrand, state_machine::OperationType};

/// Provider-agnostic request handed to the gateway collaborator. The
/// provider-specific wire format is owned by the adapter behind
/// `GatewayInterface`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub operation: OperationType,
    pub charge_external_id: String,
    pub gateway_transaction_id: Option<String>,
    /// Amount in minor units, surcharge included.
    pub amount: i64,
    pub card_brand: CardBrand,
    /// Issuer response forwarded when completing a 3-D Secure challenge.
    pub three_ds_result: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GatewayOutcomeStatus {
    Authorised,
    Rejected,
    ThreeDsRequired,
    CaptureSubmitted,
    Captured,
}

/// Parameters the cardholder's browser needs to complete a 3-D Secure
/// challenge with the issuer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreeDsParams {
    pub issuer_url: String,
    pub pa_request: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub status: GatewayOutcomeStatus,
    pub transaction_id: Option<String>,
    pub three_ds_params: Option<ThreeDsParams>,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway returned an error response: {0}")]
    Generic(String),
    #[error("timed out connecting to the gateway")]
    ConnectionTimeout,
    #[error("unexpected gateway response: {0}")]
    Unexpected(String),
}

/// The result of one gateway invocation, errors folded in as values so the
/// post-operation phase always runs and the charge never sticks in a
/// locked-for-processing status.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayOutcome {
    Response(GatewayResponse),
    Error(GatewayError),
}

impl GatewayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

impl From<Result<GatewayResponse, GatewayError>> for GatewayOutcome {
    fn from(result: Result<GatewayResponse, GatewayError>) -> Self {
        match result {
            Ok(response) => Self::Response(response),
            Err(error) => Self::Error(error),
        }
    }
}
