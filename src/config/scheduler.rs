//! Expiry sweeper configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Sweeper configuration, loaded from `SCHEDULER_INTERVAL_SEC`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between expiry sweeps
    #[serde(default = "default_interval")]
    pub interval_sec: u64,
}

impl SchedulerConfig {
    /// Sweep interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_sec)
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_sec == 0 {
            return Err(ValidationError::InvalidSchedulerInterval);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_sec: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_one_minute() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = SchedulerConfig { interval_sec: 0 };
        assert!(config.validate().is_err());
    }
}
