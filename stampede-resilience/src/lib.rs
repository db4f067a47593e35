//! Resilience patterns for Stampede
//!
//! Worker dialing is the only place the coordinator retries on its own; the
//! round-level retries of the magic controller are decided by its gates, not
//! by a policy here.

pub mod backoff;
pub mod retry;

pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
