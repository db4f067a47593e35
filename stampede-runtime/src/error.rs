//! Runtime error types

use thiserror::Error;

use stampede_ipc::IpcError;

/// Errors that stop the worker daemon or one of its sessions
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("IPC error: {0}")]
    Ipc(#[from] IpcError),
}
