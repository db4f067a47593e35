//! Stampede Execution Engine
//!
//! Drives a fleet of remote load-generating workers: connecting to them,
//! fanning each benchmark round out over the fleet and collecting the
//! results, and the three controllers (manual, stress and magic) that decide
//! which rounds to run.

pub mod connection;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod magic;
pub mod manual;
pub mod schedule;
pub mod stress;
pub mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types
pub use connection::{PendingCall, TcpWorkerClient, WorkerConnection};
pub use controller::{EndReason, RecordSink, RunSummary};
pub use coordinator::{Coordinator, RoundResult, WorkerDiagnostic, WorkerOutcome};
pub use error::ExecutionError;
pub use magic::{FaultClass, MagicController, RetryFlags, Verdict};
pub use manual::ManualController;
pub use schedule::{ErrorPredicate, RateSchedule};
pub use stress::{StressController, StressState, Transition};
pub use worker::{connect_workers, WorkerHandle};
