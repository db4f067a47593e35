//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;

use crate::domains::utils::parse_seconds;
use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_coordinator_overrides(&mut config.coordinator)?;
        self.apply_stress_overrides(&mut config.stress)?;
        self.apply_magic_overrides(&mut config.magic)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        self.apply_worker_overrides(&mut config.worker)?;
        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(host) = self.get_env_var("TARGET_HOST") {
            config.host = host;
        }
        if let Some(port) = self.parse_env_var("TARGET_PORT")? {
            config.port = port;
        }
        if let Ok(path) = self.get_env_var("TARGET_PATH") {
            config.path = path;
        }
        if let Some(requests) = self.parse_env_var("TARGET_REQUESTS_PER_CONNECTION")? {
            config.requests_per_connection = requests;
        }
        Ok(())
    }

    fn apply_coordinator_overrides(
        &self,
        config: &mut crate::domains::coordinator::CoordinatorConfig,
    ) -> ConfigResult<()> {
        if let Ok(workers) = self.get_env_var("WORKERS") {
            config.workers = workers
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(partition) = self.parse_env_var("RATE_PARTITION")? {
            config.rate_partition = partition;
        }
        if let Ok(timeout) = self.get_env_var("DIAL_TIMEOUT") {
            config.dial_timeout = parse_seconds(&timeout)
                .map_err(|e| ConfigError::EnvError(format!("Invalid DIAL_TIMEOUT: {}", e)))?;
        }
        Ok(())
    }

    fn apply_stress_overrides(
        &self,
        config: &mut crate::domains::stress::StressConfig,
    ) -> ConfigResult<()> {
        if let Some(rate) = self.parse_env_var("STRESS_STARTING_RATE")? {
            config.starting_rate = rate;
        }
        if let Some(cooldown) = self.parse_env_var("STRESS_COOLDOWN")? {
            config.cooldown = cooldown;
        }
        if let Ok(threshold) = self.get_env_var("STRESS_ERROR_THRESHOLD") {
            config.error_threshold = if threshold.eq_ignore_ascii_case("any") {
                None
            } else {
                Some(threshold.parse().map_err(|e| {
                    ConfigError::EnvError(format!("Invalid STRESS_ERROR_THRESHOLD: {}", e))
                })?)
            };
        }
        if let Ok(delay) = self.get_env_var("STRESS_ROUND_DELAY") {
            config.round_delay = parse_seconds(&delay)
                .map_err(|e| ConfigError::EnvError(format!("Invalid STRESS_ROUND_DELAY: {}", e)))?;
        }
        if let Some(max_rate) = self.parse_env_var("STRESS_MAX_RATE")? {
            config.max_rate = Some(max_rate);
        }
        Ok(())
    }

    fn apply_magic_overrides(
        &self,
        config: &mut crate::domains::magic::MagicConfig,
    ) -> ConfigResult<()> {
        if let Some(rate) = self.parse_env_var("MAGIC_STARTING_RATE")? {
            config.starting_rate = rate;
        }
        if let Some(step) = self.parse_env_var("MAGIC_STEP")? {
            config.step = step;
        }
        if let Ok(backoff) = self.get_env_var("MAGIC_EXHAUSTION_BACKOFF") {
            config.exhaustion_backoff = parse_seconds(&backoff).map_err(|e| {
                ConfigError::EnvError(format!("Invalid MAGIC_EXHAUSTION_BACKOFF: {}", e))
            })?;
        }
        if let Some(max_rate) = self.parse_env_var("MAGIC_MAX_RATE")? {
            config.max_rate = Some(max_rate);
        }
        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Some(level) = self.parse_env_var("LOG_LEVEL")? {
            config.level = level;
        }
        if let Some(format) = self.parse_env_var("LOG_FORMAT")? {
            config.format = format;
        }
        Ok(())
    }

    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(path) = self.get_env_var("OUTPUT_FILE") {
            config.sink = stampede_output::OutputSink::file(path);
        }
        if let Ok(columns) = self.get_env_var("OUTPUT_COLUMNS") {
            config.columns = Some(
                columns
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            );
        }
        Ok(())
    }

    fn apply_worker_overrides(
        &self,
        config: &mut crate::domains::worker::WorkerConfig,
    ) -> ConfigResult<()> {
        if let Ok(bind) = self.get_env_var("WORKER_BIND_ADDRESS") {
            config.bind_address = bind;
        }
        if let Some(port) = self.parse_env_var("WORKER_PORT")? {
            config.port = port;
        }
        if let Ok(path) = self.get_env_var("HTTPERF_PATH") {
            config.httperf_path = path;
        }
        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    /// Parse a prefixed environment variable when it is set
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
