//! Core error types for Stampede

use thiserror::Error;

use crate::types::BenchmarkId;

/// Fault taxonomy shared by the coordinator and the controllers.
///
/// Per-worker faults (`Dial`, `Call`, `Parse`) degrade a round's trust flag
/// but never abort it. The remaining variants describe round-level
/// conditions detected by the controllers.
#[derive(Debug, Error)]
pub enum StampedeError {
    /// The worker could not be reached when the call was issued
    #[error("Failed to dial worker {worker_id}: {reason}")]
    Dial { worker_id: String, reason: String },

    /// Transport failure while a call was in flight
    #[error("Call to worker {worker_id} failed: {reason}")]
    Call { worker_id: String, reason: String },

    /// The worker's report did not match the expected layout
    #[error("Report from worker {worker_id} could not be parsed: {source}")]
    Parse {
        worker_id: String,
        #[source]
        source: ParseError,
    },

    /// At least one worker failed to contribute a record
    #[error("Round {benchmark_id} is untrusted: {failures} worker(s) failed")]
    RoundUntrusted {
        benchmark_id: BenchmarkId,
        failures: usize,
    },

    /// Realised connection rates diverge too much between workers
    #[error("Connection rate stddev {stddev:.2} exceeds threshold {threshold:.2}")]
    StatisticalInconsistency { stddev: f64, threshold: f64 },

    /// A worker's environment ran out of ephemeral resources
    #[error("Worker {worker_id} reported resource exhaustion ({signature})")]
    EnvironmentExhaustion { worker_id: String, signature: String },

    /// Too many connections were refused; the target is presumed down
    #[error("Target unreachable: {refused} of {attempted} connections refused")]
    TargetUnreachable { refused: f64, attempted: f64 },
}

impl StampedeError {
    /// Identifier of the worker the fault is attributed to, if any
    pub fn worker_id(&self) -> Option<&str> {
        match self {
            StampedeError::Dial { worker_id, .. }
            | StampedeError::Call { worker_id, .. }
            | StampedeError::Parse { worker_id, .. }
            | StampedeError::EnvironmentExhaustion { worker_id, .. } => Some(worker_id),
            _ => None,
        }
    }

    /// Whether this fault is confined to a single worker's contribution
    pub fn is_worker_fault(&self) -> bool {
        matches!(
            self,
            StampedeError::Dial { .. } | StampedeError::Call { .. } | StampedeError::Parse { .. }
        )
    }
}

/// Result type alias for Stampede
pub type Result<T> = std::result::Result<T, StampedeError>;

/// Failure to turn a raw report into a record.
///
/// `field` is the 1-based position of the first capture that failed, in the
/// report's fixed field order (position 0 is the whole match).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Error parsing field {field} ({name}): section not found in report")]
    Missing { field: usize, name: &'static str },

    #[error("Error parsing field {field} ({name}): {value:?} is not a number")]
    NotNumeric {
        field: usize,
        name: &'static str,
        value: String,
    },
}

impl ParseError {
    /// 1-based position of the offending field
    pub fn field(&self) -> usize {
        match self {
            ParseError::Missing { field, .. } | ParseError::NotNumeric { field, .. } => *field,
        }
    }

    /// Name of the offending field
    pub fn name(&self) -> &'static str {
        match self {
            ParseError::Missing { name, .. } | ParseError::NotNumeric { name, .. } => name,
        }
    }
}
