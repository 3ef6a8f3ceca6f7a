//! Capture queue processor.
//!
//! Drains capture-work messages and drives each through the orchestration
//! template with bounded retries. Safe to run many instances concurrently:
//! message visibility timeouts and the charge's optimistic lock are the only
//! coordination mechanisms — there is no leader election.

pub mod consumer;
pub mod settings;

pub use consumer::{CaptureConsumer, MessageDisposition};
pub use settings::CaptureSettings;
