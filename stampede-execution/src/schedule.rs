//! Ramp step schedule and the "has errors" predicate

use stampede_config::{Breakpoint, StressConfig};
use stampede_core::{set_has_errors, total_errors, PerformanceRecord};

/// Sorted breakpoint table mapping a reached rate to the step used from
/// there on.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSchedule {
    breakpoints: Vec<Breakpoint>,
}

impl RateSchedule {
    /// Later entries win when two breakpoints share a rate
    pub fn new(breakpoints: impl IntoIterator<Item = Breakpoint>) -> Self {
        let mut breakpoints: Vec<Breakpoint> = breakpoints.into_iter().collect();
        // Stable sort keeps insertion order among equal rates
        breakpoints.sort_by_key(|b| b.rate);

        let mut deduped: Vec<Breakpoint> = Vec::with_capacity(breakpoints.len());
        for breakpoint in breakpoints {
            match deduped.last_mut() {
                Some(last) if last.rate == breakpoint.rate => *last = breakpoint,
                _ => deduped.push(breakpoint),
            }
        }

        Self {
            breakpoints: deduped,
        }
    }

    pub fn from_config(config: &StressConfig) -> Self {
        Self::new(config.schedule.iter().copied())
    }

    /// Step of the last breakpoint at or below `rate`, if any
    pub fn step_at(&self, rate: u64) -> Option<u64> {
        let idx = self.breakpoints.partition_point(|b| b.rate <= rate);
        idx.checked_sub(1).map(|i| self.breakpoints[i].step)
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }
}

/// Decides whether a round counts as "the server is erroring"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPredicate {
    /// Any record with a non-zero error total
    AnyError,
    /// Errors summed over all records exceed the threshold
    Threshold(u64),
}

impl ErrorPredicate {
    pub fn from_threshold(threshold: Option<u64>) -> Self {
        threshold.map_or(ErrorPredicate::AnyError, ErrorPredicate::Threshold)
    }

    pub fn is_stressed(&self, records: &[PerformanceRecord]) -> bool {
        match self {
            ErrorPredicate::AnyError => set_has_errors(records),
            ErrorPredicate::Threshold(limit) => total_errors(records) > *limit as f64,
        }
    }
}
