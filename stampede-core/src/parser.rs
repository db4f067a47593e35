//! Parser for httperf performance reports
//!
//! A report is a fixed sequence of line groups. Each group is matched in
//! order, starting after the previous match, and contributes a contiguous run
//! of capture fields. Fields are numbered 1..=51 across the whole report;
//! field 0 is the matched span itself.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::record::ReportMetrics;

/// Number of positional capture fields in a report (excluding the span)
pub const FIELD_COUNT: usize = 51;

/// Field names in report order; index 0 is the matched span
pub const FIELD_NAMES: [&str; FIELD_COUNT + 1] = [
    "Raw",
    "ConnectionBurstLength",
    "TotalConnections",
    "TotalRequests",
    "TotalReplies",
    "TestDuration",
    "ConnectionsPerSecond",
    "MsPerConnection",
    "ConcurrentConnections",
    "ConnectionTimeMin",
    "ConnectionTimeAvg",
    "ConnectionTimeMax",
    "ConnectionTimeMedian",
    "ConnectionTimeStddev",
    "ConnectionTimeConnect",
    "RepliesPerConnection",
    "RequestsPerSecond",
    "MsPerRequest",
    "RequestSize",
    "RepliesPerSecMin",
    "RepliesPerSecAvg",
    "RepliesPerSecMax",
    "RepliesPerSecStddev",
    "RepliesPerSecNumSamples",
    "ReplyTimeResponse",
    "ReplyTimeTransfer",
    "ReplySizeHeader",
    "ReplySizeContent",
    "ReplySizeFooter",
    "ReplySizeTotal",
    "ReplyStatus_1xx",
    "ReplyStatus_2xx",
    "ReplyStatus_3xx",
    "ReplyStatus_4xx",
    "ReplyStatus_5xx",
    "CpuTimeUser",
    "CpuTimeSystem",
    "CpuPercUser",
    "CpuPercSystem",
    "CpuPercTotal",
    "NetIOValue",
    "NetIOUnit",
    "NetIOBytesPerSecond",
    "ErrTotal",
    "ErrClientTimeout",
    "ErrSocketTimeout",
    "ErrConnectionRefused",
    "ErrConnectionReset",
    "ErrFdUnavail",
    "ErrAddrUnavail",
    "ErrFtabFull",
    "ErrOther",
];

const NUM: &str = r"([0-9]*\.?[0-9]*)";
const INT: &str = r"([0-9]*)";

struct Section {
    /// Report field number of the section's first capture
    first_field: usize,
    regex: Regex,
}

/// Line-group patterns in report order. `{n}` and `{i}` expand to the
/// decimal and integer capture groups.
const SECTION_PATTERNS: &[(usize, &str)] = &[
    (1, r"Maximum connect burst length: {i}"),
    (
        2,
        r"Total: connections {i} requests {i} replies {i} test-duration {n} s",
    ),
    (
        6,
        r"Connection rate: {n} conn/s \({n} ms/conn, <={i} concurrent connections\)",
    ),
    (
        9,
        r"Connection time \[ms\]: min {n} avg {n} max {n} median {n} stddev {n}",
    ),
    (14, r"Connection time \[ms\]: connect {n}"),
    (15, r"Connection length \[replies/conn\]: {n}"),
    (16, r"Request rate: {n} req/s \({n} ms/req\)"),
    (18, r"Request size \[B\]: {n}"),
    (
        19,
        r"Reply rate \[replies/s\]: min {n} avg {n} max {n} stddev {n} \({i} samples\)",
    ),
    (24, r"Reply time \[ms\]: response {n} transfer {n}"),
    (
        26,
        r"Reply size \[B\]: header {n} content {n} footer {n} \(total {n}\)",
    ),
    (
        30,
        r"Reply status: 1xx={i} 2xx={i} 3xx={i} 4xx={i} 5xx={i}",
    ),
    (
        35,
        r"CPU time \[s\]: user {n} system {n} \(user {n}% system {n}% total {n}%\)",
    ),
    (40, r"Net I/O: {n} (.*) \((.*) bps\)"),
    (
        43,
        r"Errors: total {i} client-timo {i} socket-timo {i} connrefused {i} connreset {i}",
    ),
    (
        48,
        r"Errors: fd-unavail {i} addrunavail {i} ftab-full {i} other {i}",
    ),
];

static SECTIONS: Lazy<Vec<Section>> = Lazy::new(|| {
    SECTION_PATTERNS
        .iter()
        .map(|(first_field, pattern)| {
            let expanded = pattern.replace("{n}", NUM).replace("{i}", INT);
            Section {
                first_field: *first_field,
                regex: Regex::new(&format!("(?m)^{}", expanded))
                    .expect("report section patterns are valid"),
            }
        })
        .collect()
});

/// Extract the raw capture strings of a report.
///
/// Returns `FIELD_COUNT + 1` strings (span first), or the first field of the
/// earliest section that could not be located.
pub fn capture_fields(text: &str) -> Result<Vec<&str>, ParseError> {
    let mut fields = Vec::with_capacity(FIELD_COUNT + 1);
    fields.push("");

    let mut cursor = 0;
    let mut span_start = None;

    for section in SECTIONS.iter() {
        let captures =
            section
                .regex
                .captures_at(text, cursor)
                .ok_or(ParseError::Missing {
                    field: section.first_field,
                    name: FIELD_NAMES[section.first_field],
                })?;

        // Group 0 always participates in a successful match
        let whole = captures.get(0).map(|m| (m.start(), m.end())).unwrap_or((cursor, cursor));
        span_start.get_or_insert(whole.0);
        cursor = whole.1;

        fields.extend(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str()).unwrap_or("")),
        );
    }

    fields[0] = &text[span_start.unwrap_or(0)..cursor];
    debug_assert_eq!(fields.len(), FIELD_COUNT + 1);
    Ok(fields)
}

/// Parse a report into its metrics.
///
/// Parsing is all-or-nothing: on failure no metrics are produced, and the
/// error names the first field, in report order, that was missing or not
/// numeric.
pub fn parse_report(text: &str) -> Result<ReportMetrics, ParseError> {
    let fields = capture_fields(text)?;

    let num = |field: usize| -> Result<f64, ParseError> {
        let value = fields[field];
        value.parse::<f64>().map_err(|_| ParseError::NotNumeric {
            field,
            name: FIELD_NAMES[field],
            value: value.to_string(),
        })
    };

    Ok(ReportMetrics {
        connection_burst_length: num(1)?,
        total_connections: num(2)?,
        total_requests: num(3)?,
        total_replies: num(4)?,
        test_duration: num(5)?,
        connections_per_second: num(6)?,
        ms_per_connection: num(7)?,
        concurrent_connections: num(8)?,
        connection_time_min: num(9)?,
        connection_time_avg: num(10)?,
        connection_time_max: num(11)?,
        connection_time_median: num(12)?,
        connection_time_stddev: num(13)?,
        connection_time_connect: num(14)?,
        replies_per_connection: num(15)?,
        requests_per_second: num(16)?,
        ms_per_request: num(17)?,
        request_size: num(18)?,
        replies_per_sec_min: num(19)?,
        replies_per_sec_avg: num(20)?,
        replies_per_sec_max: num(21)?,
        replies_per_sec_stddev: num(22)?,
        replies_per_sec_num_samples: num(23)?,
        reply_time_response: num(24)?,
        reply_time_transfer: num(25)?,
        reply_size_header: num(26)?,
        reply_size_content: num(27)?,
        reply_size_footer: num(28)?,
        reply_size_total: num(29)?,
        reply_status_1xx: num(30)?,
        reply_status_2xx: num(31)?,
        reply_status_3xx: num(32)?,
        reply_status_4xx: num(33)?,
        reply_status_5xx: num(34)?,
        cpu_time_user: num(35)?,
        cpu_time_system: num(36)?,
        cpu_perc_user: num(37)?,
        cpu_perc_system: num(38)?,
        cpu_perc_total: num(39)?,
        net_io_value: num(40)?,
        net_io_unit: fields[41].to_string(),
        net_io_bytes_per_second: fields[42].to_string(),
        err_total: num(43)?,
        err_client_timeout: num(44)?,
        err_socket_timeout: num(45)?,
        err_connection_refused: num(46)?,
        err_connection_reset: num(47)?,
        err_fd_unavail: num(48)?,
        err_addr_unavail: num(49)?,
        err_ftab_full: num(50)?,
        err_other: num(51)?,
        raw: fields[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ReportBuilder, SAMPLE_REPORT};

    #[test]
    fn test_capture_count() {
        let fields = capture_fields(SAMPLE_REPORT).unwrap();
        assert_eq!(fields.len(), FIELD_COUNT + 1);
        assert_eq!(fields[23], "1");
        assert_eq!(fields[40], "6101.1");
        assert_eq!(fields[41], "KB/s");
        assert_eq!(fields[42], "50.0*10^6");
    }

    #[test]
    fn test_parse_totals() {
        let metrics = parse_report(SAMPLE_REPORT).unwrap();
        assert_eq!(metrics.total_connections, 10000.0);
        assert_eq!(metrics.total_requests, 10000.0);
        assert_eq!(metrics.total_replies, 10000.0);
        assert_eq!(metrics.test_duration, 6.964);
    }

    #[test]
    fn test_parse_all_sections() {
        let metrics = parse_report(SAMPLE_REPORT).unwrap();
        assert_eq!(metrics.connection_burst_length, 1.0);
        assert_eq!(metrics.connections_per_second, 1435.9);
        assert_eq!(metrics.concurrent_connections, 1.0);
        assert_eq!(metrics.connection_time_max, 27.4);
        assert_eq!(metrics.connection_time_connect, 0.1);
        assert_eq!(metrics.replies_per_connection, 1.0);
        assert_eq!(metrics.request_size, 72.0);
        assert_eq!(metrics.replies_per_sec_avg, 1444.8);
        assert_eq!(metrics.replies_per_sec_num_samples, 1.0);
        assert_eq!(metrics.reply_size_total, 4281.0);
        assert_eq!(metrics.reply_status_2xx, 10000.0);
        assert_eq!(metrics.cpu_perc_total, 93.5);
        assert_eq!(metrics.net_io_value, 6101.1);
        assert_eq!(metrics.net_io_unit, "KB/s");
        assert_eq!(metrics.net_io_bytes_per_second, "50.0*10^6");
        assert_eq!(metrics.err_total, 0.0);
        assert_eq!(metrics.err_other, 0.0);
        assert!(metrics.raw.starts_with("Maximum connect burst length"));
        assert!(metrics.raw.ends_with("other 0"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_report(SAMPLE_REPORT).unwrap();
        let second = parse_report(SAMPLE_REPORT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_connection_rate_section() {
        let broken: String = SAMPLE_REPORT
            .lines()
            .filter(|line| !line.starts_with("Connection rate:"))
            .collect::<Vec<_>>()
            .join("\n");

        let err = parse_report(&broken).unwrap_err();
        assert_eq!(err.field(), 6);
        assert_eq!(err.name(), "ConnectionsPerSecond");
        assert!(matches!(err, ParseError::Missing { .. }));
    }

    #[test]
    fn test_empty_numeric_capture() {
        let broken = SAMPLE_REPORT.replace("(1 samples)", "( samples)");
        let err = parse_report(&broken).unwrap_err();
        assert_eq!(err.field(), 23);
        assert!(matches!(err, ParseError::NotNumeric { .. }));
    }

    #[test]
    fn test_multi_digit_sample_count() {
        let report = ReportBuilder::new().samples(12).build();
        let metrics = parse_report(&report).unwrap();
        assert_eq!(metrics.replies_per_sec_num_samples, 12.0);
    }

    #[test]
    fn test_surrounding_output_is_ignored() {
        let text = format!(
            "httperf --hog --server localhost --port 80\n{}\n",
            SAMPLE_REPORT
        );
        let metrics = parse_report(&text).unwrap();
        assert_eq!(metrics, parse_report(SAMPLE_REPORT).unwrap());
    }

    #[test]
    fn test_error_counters() {
        let report = ReportBuilder::new()
            .connections(1000)
            .connection_refused(600)
            .client_timeouts(40)
            .build();
        let metrics = parse_report(&report).unwrap();
        assert_eq!(metrics.err_connection_refused, 600.0);
        assert_eq!(metrics.err_client_timeout, 40.0);
        assert_eq!(metrics.err_total, 640.0);
    }

    #[test]
    fn test_empty_report() {
        let err = parse_report("").unwrap_err();
        assert_eq!(err.field(), 1);
    }
}
