//! Ramping stress-test configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_ceiling, validate_positive, Validatable};

/// Step size to use once the rate reaches `rate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub rate: u64,
    pub step: u64,
}

impl Breakpoint {
    pub const fn new(rate: u64, step: u64) -> Self {
        Self { rate, step }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Connection rate of the first round
    pub starting_rate: u64,

    /// Step used until the schedule says otherwise
    pub initial_step: u64,

    /// Sparse rate -> step schedule
    pub schedule: Vec<Breakpoint>,

    /// Seconds each worker must sustain the rate per round
    pub round_duration_secs: u64,

    /// A round is in error when its summed error count exceeds this value;
    /// `None` flags any error at all
    pub error_threshold: Option<u64>,

    /// Extra rounds to run after errors are first seen
    pub cooldown: u32,

    /// Pause between rounds
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub round_delay: Duration,

    /// Stop cleanly once the rate would exceed this value
    pub max_rate: Option<u64>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            starting_rate: 25,
            initial_step: 25,
            schedule: vec![
                Breakpoint::new(0, 25),
                Breakpoint::new(100, 50),
                Breakpoint::new(500, 100),
            ],
            round_duration_secs: 10,
            error_threshold: Some(500),
            cooldown: 3,
            round_delay: Duration::from_secs(5),
            max_rate: None,
        }
    }
}

impl Validatable for StressConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.starting_rate, "starting_rate", self.domain_name())?;
        validate_positive(self.initial_step, "initial_step", self.domain_name())?;
        validate_positive(
            self.round_duration_secs,
            "round_duration_secs",
            self.domain_name(),
        )?;
        validate_ceiling(self.max_rate, self.starting_rate, "max_rate", self.domain_name())?;

        let mut seen = HashSet::new();
        for breakpoint in &self.schedule {
            if breakpoint.step == 0 {
                return Err(self.validation_error(format!(
                    "schedule step at rate {} must be greater than 0",
                    breakpoint.rate
                )));
            }
            if !seen.insert(breakpoint.rate) {
                return Err(self.validation_error(format!(
                    "schedule lists rate {} more than once",
                    breakpoint.rate
                )));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "stress"
    }
}
