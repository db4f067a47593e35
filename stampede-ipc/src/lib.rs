//! Coordinator <-> worker communication for Stampede
//!
//! This crate provides the wire protocol and the TCP transport used between
//! the coordinator and the remote worker daemons. Messages are JSON
//! envelopes, one per line.

pub mod error;
pub mod protocol;
pub mod transport;

// Re-export commonly used types
pub use error::IpcError;
pub use protocol::{
    CoordinatorMessage, MessageEnvelope, WorkerError, WorkerMessage, WorkerStatus,
    IPC_PROTOCOL_VERSION,
};
pub use transport::{decode_line, encode_line, IpcTransport, TcpTransport};

/// Default TCP port of a worker daemon
pub const DEFAULT_WORKER_PORT: u16 = 1717;
