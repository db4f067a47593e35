//! Core domain models and types for Stampede
//!
//! This crate contains the fundamental types used throughout the Stampede
//! system: the benchmark request handed to each worker, the raw report a
//! worker sends back, the parsed performance record and the parser that
//! turns one into the other. It has minimal dependencies and defines the
//! domain language of the application.

pub mod error;
pub mod parser;
pub mod record;
pub mod stats;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types at the crate root
pub use error::{ParseError, Result, StampedeError};
pub use parser::{parse_report, FIELD_COUNT, FIELD_NAMES};
pub use record::{set_has_errors, total_errors, PerformanceRecord, ReportMetrics};
pub use types::{BenchmarkId, BenchmarkRequest, RatePartition, RawReport};

/// Current wall-clock time as seconds since the UNIX epoch.
#[inline]
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
