//! Domain model for the chargeflow payment engine.
//!
//! Everything in this crate is pure data and pure logic: the charge
//! aggregate, its append-only event log, the lifecycle state machine and the
//! typed outcomes of a gateway invocation. Persistence, transports and
//! gateway wire formats live behind the traits in `chargeflow_interfaces`.

pub mod charge;
pub mod errors;
pub mod gateway;
pub mod state_machine;

pub use charge::{CardBrand, Charge, ChargeEvent, GatewayAccount, ProviderKind};
pub use gateway::{GatewayError, GatewayOutcome, GatewayRequest, GatewayResponse, ThreeDsParams};
pub use state_machine::{ChargeStatus, OperationType};
