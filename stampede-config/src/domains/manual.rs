//! Single-round (manual) mode configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Load for a single manual round, before it is split across workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub num_connections: u64,
    pub connection_rate: u64,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            num_connections: 6000,
            connection_rate: 200,
        }
    }
}

impl Validatable for ManualConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.num_connections, "num_connections", self.domain_name())?;
        validate_positive(self.connection_rate, "connection_rate", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "manual"
    }
}
