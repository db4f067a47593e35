//! Worker daemon configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{validate_port_range, validate_required_string, Validatable};

/// Settings for `stampede worker`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Load-generator executable, looked up on `PATH` when not absolute
    pub httperf_path: String,
    /// Name announced to coordinators; defaults to the bound address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 1717,
            httperf_path: "httperf".to_string(),
            worker_id: None,
        }
    }
}

impl WorkerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Validatable for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;
        validate_required_string(&self.httperf_path, "httperf_path", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "worker"
    }
}
