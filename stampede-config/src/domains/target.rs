//! Benchmark target configuration

use serde::{Deserialize, Serialize};
use stampede_core::BenchmarkRequest;

use crate::error::ConfigResult;
use crate::validation::{validate_port_range, validate_positive, validate_required_string, Validatable};

/// The HTTP server under test and the per-connection request shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    /// Request path (must begin with `/`)
    pub path: String,
    pub requests_per_connection: u32,
    /// Seconds before the load generator gives up on a request
    pub timeout_secs: Option<u32>,
    /// Run the load generator in `--hog` mode
    #[serde(default = "crate::domains::utils::default_true")]
    pub hog: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            path: "/".to_string(),
            requests_per_connection: 5,
            timeout_secs: Some(5),
            hog: true,
        }
    }
}

impl TargetConfig {
    /// Logical round request against this target
    pub fn request(&self, num_connections: u64, connection_rate: u64) -> BenchmarkRequest {
        BenchmarkRequest {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
            num_connections,
            connection_rate,
            requests_per_connection: self.requests_per_connection,
            timeout_secs: self.timeout_secs,
            hog: self.hog,
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.host, "host", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;

        if !self.path.starts_with('/') {
            return Err(self.validation_error(format!(
                "path must start with '/', got '{}'",
                self.path
            )));
        }

        validate_positive(
            self.requests_per_connection,
            "requests_per_connection",
            self.domain_name(),
        )?;

        if let Some(timeout) = self.timeout_secs {
            validate_positive(timeout, "timeout_secs", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_target() {
        let request = TargetConfig::default().request(6000, 200);
        assert_eq!(request.host, "localhost");
        assert_eq!(request.num_connections, 6000);
        assert_eq!(request.connection_rate, 200);
        assert_eq!(request.timeout_secs, Some(5));
        assert!(request.hog);
    }

    #[test]
    fn test_defaults() {
        let config = TargetConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 80);
        assert_eq!(config.requests_per_connection, 5);
        assert!(config.hog);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_relative_path() {
        let config = TargetConfig {
            path: "index.html".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = TargetConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TargetConfig {
            timeout_secs: None,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
