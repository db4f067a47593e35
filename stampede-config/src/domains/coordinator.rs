//! Worker fleet and fan-out configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use stampede_core::RatePartition;
use stampede_resilience::{BackoffStrategy, RetryPolicy};

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_endpoint, validate_positive, Validatable};

/// How the coordinator reaches and loads its workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Worker daemon addresses (`host:port`), in dispatch order
    pub workers: Vec<String>,

    /// Whether each worker receives the full connection rate or a share
    pub rate_partition: RatePartition,

    /// Deadline for connecting to a worker and receiving its greeting
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub dial_timeout: Duration,

    /// Start-up dial retry behaviour
    pub dial_retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: Vec::new(),
            rate_partition: RatePartition::Replicate,
            dial_timeout: Duration::from_secs(10),
            dial_retry: RetryPolicy::default(),
        }
    }
}

impl Validatable for CoordinatorConfig {
    fn validate(&self) -> ConfigResult<()> {
        for worker in &self.workers {
            validate_endpoint(worker, "workers", self.domain_name())?;
        }

        validate_positive(
            self.dial_timeout.as_secs(),
            "dial_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.dial_retry.max_attempts,
            "dial_retry.max_attempts",
            self.domain_name(),
        )?;
        if self.dial_retry.max_delay < self.dial_retry.initial_delay {
            return Err(ConfigError::DomainError {
                domain: self.domain_name().to_string(),
                message: "dial_retry.max_delay is shorter than dial_retry.initial_delay".to_string(),
            });
        }
        if let BackoffStrategy::Exponential { base } = self.dial_retry.backoff_strategy {
            if base < 1.0 {
                return Err(ConfigError::DomainError {
                    domain: self.domain_name().to_string(),
                    message: format!("dial_retry exponential base {} is below 1", base),
                });
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "coordinator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert!(config.workers.is_empty());
        assert_eq!(config.rate_partition, RatePartition::Replicate);
        assert_eq!(config.dial_timeout, Duration::from_secs(10));
        assert_eq!(config.dial_retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_worker_address() {
        let config = CoordinatorConfig {
            workers: vec!["10.0.0.1:1717".to_string(), "10.0.0.2".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("10.0.0.2"));
    }

    #[test]
    fn test_yaml() {
        let config: CoordinatorConfig = serde_yaml::from_str(
            "workers: ['a:1717', 'b:1717']\nrate_partition: divide\ndial_timeout: 3\n",
        )
        .unwrap();
        assert_eq!(config.workers.len(), 2);
        assert_eq!(config.rate_partition, RatePartition::Divide);
        assert_eq!(config.dial_timeout, Duration::from_secs(3));
        assert_eq!(config.dial_retry, RetryPolicy::default());
    }

    #[test]
    fn test_dial_retry_strategy_from_yaml() {
        let config: CoordinatorConfig = serde_yaml::from_str(
            "dial_retry:\n  max_attempts: 4\n  initial_delay: 500ms\n  max_delay: 5s\n  \
             backoff_strategy:\n    type: exponential\n    base: 2.0\n  jitter: true\n",
        )
        .unwrap();
        assert_eq!(config.dial_retry.max_attempts, 4);
        assert_eq!(
            config.dial_retry.backoff_strategy,
            BackoffStrategy::Exponential { base: 2.0 }
        );
        assert!(config.dial_retry.jitter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dial_retry_delays_inverted() {
        let config = CoordinatorConfig {
            dial_retry: RetryPolicy {
                initial_delay: Duration::from_secs(10),
                max_delay: Duration::from_secs(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_delay"));
    }
}
