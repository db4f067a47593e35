//! Error types for benchmark execution

use std::time::Duration;

use stampede_config::ConfigError;
use stampede_core::StampedeError;
use stampede_ipc::{IpcError, WorkerError};
use stampede_output::OutputError;
use stampede_resilience::Retryable;
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No workers configured")]
    NoWorkers,

    #[error("Failed to connect to worker {addr}: {source}")]
    DialFailed {
        addr: String,
        #[source]
        source: IpcError,
    },

    #[error("Worker {addr} did not greet within {timeout:?}")]
    HandshakeTimeout { addr: String, timeout: Duration },

    #[error("IPC error: {0}")]
    IpcError(#[from] IpcError),

    #[error("Worker error: {0}")]
    WorkerError(#[from] WorkerError),

    #[error("Worker call was abandoned: {0}")]
    CallAbandoned(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    #[error("Output error: {0}")]
    OutputError(#[from] OutputError),

    /// A round-level fault persisted past its single retry
    #[error("Run aborted at rate {rate}: {reason}")]
    Aborted {
        rate: u64,
        #[source]
        reason: StampedeError,
    },
}

impl Retryable for ExecutionError {
    fn is_retryable(&self) -> bool {
        match self {
            ExecutionError::DialFailed { source, .. } => !source.is_fatal(),
            ExecutionError::HandshakeTimeout { .. } => true,
            ExecutionError::IpcError(err) => err.is_retryable(),
            _ => false,
        }
    }
}
