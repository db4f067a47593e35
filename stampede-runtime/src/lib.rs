//! Runtime components for Stampede
//!
//! The worker side of a benchmark: a TCP daemon that accepts coordinator
//! connections and a runner that executes the load generator and captures
//! its output.

pub mod error;
pub mod runner;
pub mod server;

// Re-export commonly used types
pub use error::RuntimeError;
pub use runner::{BenchmarkRunner, HttperfRunner};
pub use server::{bind, worker_main, WorkerServer};
