//! Domain-specific configuration modules

pub mod coordinator;
pub mod logging;
pub mod magic;
pub mod manual;
pub mod output;
pub mod stress;
pub mod target;
pub mod utils;
pub mod worker;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Server under test
    pub target: target::TargetConfig,

    /// Worker fleet and request partitioning
    pub coordinator: coordinator::CoordinatorConfig,

    /// Single-round mode
    pub manual: manual::ManualConfig,

    /// Ramping stress test
    pub stress: stress::StressConfig,

    /// Validated unattended ramp
    pub magic: magic::MagicConfig,

    /// Performance table destination
    pub output: output::OutputConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Worker daemon settings
    pub worker: worker::WorkerConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.coordinator.validate()?;
        self.manual.validate()?;
        self.stress.validate()?;
        self.magic.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        self.worker.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
