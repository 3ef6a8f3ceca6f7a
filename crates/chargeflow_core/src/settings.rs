use std::time::Duration;

use charge_models::{errors::ApplicationError, OperationType};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// Worker count = multiplier × available CPU cores, floored at one.
    pub worker_multiplier: usize,
    /// Capacity of the intake channel feeding the worker pool.
    pub queue_capacity: usize,
    /// Queue waits above this are logged as a capacity warning even when the
    /// operation itself later completes.
    pub queue_wait_warn_threshold_ms: u64,
    pub timeouts: OperationTimeouts,
}

/// Wait budgets per operation kind. Authorisation and capture are budgeted
/// independently.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationTimeouts {
    pub authorisation_ms: u64,
    pub capture_ms: u64,
}

impl ExecutorSettings {
    pub fn pool_size(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1);
        (self.worker_multiplier * cores).max(1)
    }

    pub fn queue_wait_warn_threshold(&self) -> Duration {
        Duration::from_millis(self.queue_wait_warn_threshold_ms)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.worker_multiplier == 0 {
            return Err(ApplicationError::InvalidConfigurationValueError(
                "executor worker multiplier must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ApplicationError::InvalidConfigurationValueError(
                "executor queue capacity must be at least 1".into(),
            ));
        }
        self.timeouts.validate()
    }
}

impl OperationTimeouts {
    pub fn budget_for(&self, operation: OperationType) -> Duration {
        match operation {
            OperationType::Authorisation | OperationType::Authorisation3ds => {
                Duration::from_millis(self.authorisation_ms)
            }
            OperationType::Capture => Duration::from_millis(self.capture_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.authorisation_ms == 0 || self.capture_ms == 0 {
            return Err(ApplicationError::InvalidConfigurationValueError(
                "operation wait budgets must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            worker_multiplier: 2,
            queue_capacity: 256,
            queue_wait_warn_threshold_ms: 10_000,
            timeouts: OperationTimeouts::default(),
        }
    }
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            authorisation_ms: 10_000,
            capture_ms: 15_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(ExecutorSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_worker_multiplier_is_rejected() {
        let settings = ExecutorSettings {
            worker_multiplier: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_wait_budget_is_rejected() {
        let settings = ExecutorSettings {
            timeouts: OperationTimeouts {
                authorisation_ms: 0,
                capture_ms: 15_000,
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn pool_size_has_a_floor_of_one() {
        let settings = ExecutorSettings {
            worker_multiplier: 1,
            ..Default::default()
        };
        assert!(settings.pool_size() >= 1);
    }
}
