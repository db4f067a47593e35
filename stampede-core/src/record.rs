//! Structured performance records

use serde::{Deserialize, Serialize};

use crate::types::{BenchmarkId, BenchmarkRequest};

/// Values parsed out of one load-generator report.
///
/// Every numeric value is kept as `f64`, including counts, so that all
/// parsed fields share one representation. Only the network I/O unit and
/// the bits-per-second label are textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportMetrics {
    /// The span of the report that was matched
    pub raw: String,

    pub connection_burst_length: f64,

    pub total_connections: f64,
    pub total_requests: f64,
    pub total_replies: f64,
    pub test_duration: f64,

    pub connections_per_second: f64,
    pub ms_per_connection: f64,
    pub concurrent_connections: f64,

    pub connection_time_min: f64,
    pub connection_time_avg: f64,
    pub connection_time_max: f64,
    pub connection_time_median: f64,
    pub connection_time_stddev: f64,
    pub connection_time_connect: f64,
    pub replies_per_connection: f64,

    pub requests_per_second: f64,
    pub ms_per_request: f64,
    pub request_size: f64,

    pub replies_per_sec_min: f64,
    pub replies_per_sec_avg: f64,
    pub replies_per_sec_max: f64,
    pub replies_per_sec_stddev: f64,
    pub replies_per_sec_num_samples: f64,

    pub reply_time_response: f64,
    pub reply_time_transfer: f64,

    pub reply_size_header: f64,
    pub reply_size_content: f64,
    pub reply_size_footer: f64,
    pub reply_size_total: f64,

    pub reply_status_1xx: f64,
    pub reply_status_2xx: f64,
    pub reply_status_3xx: f64,
    pub reply_status_4xx: f64,
    pub reply_status_5xx: f64,

    pub cpu_time_user: f64,
    pub cpu_time_system: f64,
    pub cpu_perc_user: f64,
    pub cpu_perc_system: f64,
    pub cpu_perc_total: f64,

    pub net_io_value: f64,
    pub net_io_unit: String,
    pub net_io_bytes_per_second: String,

    pub err_total: f64,
    pub err_client_timeout: f64,
    pub err_socket_timeout: f64,
    pub err_connection_refused: f64,
    pub err_connection_reset: f64,
    pub err_fd_unavail: f64,
    pub err_addr_unavail: f64,
    pub err_ftab_full: f64,
    pub err_other: f64,
}

/// A parsed report stamped with its provenance.
///
/// The provenance fields are not present in the report text; they are
/// supplied by the coordinator once parsing has succeeded. `request` is the
/// per-worker share actually sent, not the logical round request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub benchmark_id: BenchmarkId,
    /// Seconds since the UNIX epoch at which the call was dispatched
    pub benchmark_date: i64,
    pub request: BenchmarkRequest,
    pub metrics: ReportMetrics,
}

impl PerformanceRecord {
    pub fn new(
        benchmark_id: BenchmarkId,
        benchmark_date: i64,
        request: BenchmarkRequest,
        metrics: ReportMetrics,
    ) -> Self {
        Self {
            benchmark_id,
            benchmark_date,
            request,
            metrics,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.metrics.err_total > 0.0
    }
}

/// Whether any record in the set reports at least one error
pub fn set_has_errors(records: &[PerformanceRecord]) -> bool {
    records.iter().any(PerformanceRecord::has_errors)
}

/// Sum of `err_total` across the set
pub fn total_errors(records: &[PerformanceRecord]) -> f64 {
    records.iter().map(|r| r.metrics.err_total).sum()
}
