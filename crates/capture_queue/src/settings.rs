use std::time::Duration;

use charge_models::errors::ApplicationError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSettings {
    /// Messages fetched per batch.
    pub batch_size: usize,
    /// Capture attempts allowed per charge before the poison exit.
    pub maximum_retries: usize,
    /// Visibility delay applied when a message is re-submitted.
    pub retry_delay_seconds: u64,
    /// Pause between batch fetches.
    pub loop_interval_ms: u64,
}

impl CaptureSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.batch_size == 0 {
            return Err(ApplicationError::InvalidConfigurationValueError(
                "capture batch size must be at least 1".into(),
            ));
        }
        if self.maximum_retries == 0 {
            return Err(ApplicationError::InvalidConfigurationValueError(
                "capture maximum retries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            maximum_retries: 3,
            retry_delay_seconds: 300,
            loop_interval_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(CaptureSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_retry_budget_is_rejected() {
        let settings = CaptureSettings {
            maximum_retries: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
