//! Logging setup for Stampede
//!
//! Every process logs through `tracing` to stderr. Stdout belongs to the
//! performance table in coordinator modes, so no subscriber built here ever
//! writes to it.

pub mod init;

pub use init::{build_env_filter, build_subscriber, init_logging_from_config, init_simple_tracing, init_worker_tracing};
