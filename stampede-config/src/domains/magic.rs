//! Validated unattended ("magic") mode configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{
    validate_ceiling, validate_positive, validate_ratio, validate_required_string, Validatable,
};

/// Known stderr text for ephemeral port exhaustion on the worker host
pub const DEFAULT_EXHAUSTION_SIGNATURE: &str = "Cannot assign requested address";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagicConfig {
    pub starting_rate: u64,

    /// Fixed rate increment after each accepted round
    pub step: u64,

    pub round_duration_secs: u64,

    #[serde(with = "crate::domains::utils::serde_duration")]
    pub round_delay: Duration,

    /// Allowed stddev of realised connection rates, as a fraction of the
    /// mean requested rate
    pub rate_deviation_ratio: f64,

    /// Refused / attempted connections at or above which the target is
    /// considered unreachable
    pub refusal_ratio: f64,

    /// Substring of worker stderr that marks resource exhaustion
    pub exhaustion_signature: String,

    /// Sleep before retrying a round that hit the exhaustion signature
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub exhaustion_backoff: Duration,

    pub max_rate: Option<u64>,
}

impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            starting_rate: 25,
            step: 25,
            round_duration_secs: 10,
            round_delay: Duration::from_secs(5),
            rate_deviation_ratio: 0.05,
            refusal_ratio: 0.5,
            exhaustion_signature: DEFAULT_EXHAUSTION_SIGNATURE.to_string(),
            exhaustion_backoff: Duration::from_secs(300),
            max_rate: None,
        }
    }
}

impl Validatable for MagicConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.starting_rate, "starting_rate", self.domain_name())?;
        validate_positive(self.step, "step", self.domain_name())?;
        validate_positive(
            self.round_duration_secs,
            "round_duration_secs",
            self.domain_name(),
        )?;
        validate_ratio(
            self.rate_deviation_ratio,
            "rate_deviation_ratio",
            self.domain_name(),
        )?;
        validate_ratio(self.refusal_ratio, "refusal_ratio", self.domain_name())?;
        validate_required_string(
            &self.exhaustion_signature,
            "exhaustion_signature",
            self.domain_name(),
        )?;
        validate_ceiling(self.max_rate, self.starting_rate, "max_rate", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "magic"
    }
}
