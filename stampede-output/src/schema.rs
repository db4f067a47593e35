//! Static column schema for performance tables
//!
//! Each column is a (name, kind, accessor) triple. The standard schema lists
//! the provenance columns first, followed by every parsed report field in
//! report order. The matched report text is not part of the standard schema
//! since every value it contains already has a column of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

use stampede_core::PerformanceRecord;

/// Kind of value a column yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Float,
    Integer,
    /// Booleans have no agreed textual form in the table
    Flag,
}

impl ColumnKind {
    /// Whether the table writer knows how to render this kind
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            ColumnKind::Text | ColumnKind::Float | ColumnKind::Integer
        )
    }
}

/// One cell value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Integer(i64),
    Flag(bool),
}

impl FieldValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            FieldValue::Text(_) => ColumnKind::Text,
            FieldValue::Float(_) => ColumnKind::Float,
            FieldValue::Integer(_) => ColumnKind::Integer,
            FieldValue::Flag(_) => ColumnKind::Flag,
        }
    }

    /// Textual rendering, `None` for kinds that have none
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Float(f) => Some(format!("{}", f)),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Flag(_) => None,
        }
    }
}

pub type Accessor = fn(&PerformanceRecord) -> FieldValue;

#[derive(Clone)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub accessor: Accessor,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind, accessor: Accessor) -> Self {
        Self {
            name,
            kind,
            accessor,
        }
    }

    pub fn value(&self, record: &PerformanceRecord) -> FieldValue {
        (self.accessor)(record)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

macro_rules! metric {
    ($name:literal, $field:ident) => {
        Column::new($name, ColumnKind::Float, |r| {
            FieldValue::Float(r.metrics.$field)
        })
    };
}

macro_rules! metric_text {
    ($name:literal, $field:ident) => {
        Column::new($name, ColumnKind::Text, |r| {
            FieldValue::Text(r.metrics.$field.clone())
        })
    };
}

fn provenance_columns() -> Vec<Column> {
    vec![
        Column::new("BenchmarkId", ColumnKind::Text, |r| {
            FieldValue::Text(r.benchmark_id.to_string())
        }),
        Column::new("BenchmarkDate", ColumnKind::Integer, |r| {
            FieldValue::Integer(r.benchmark_date)
        }),
        Column::new("ArgHost", ColumnKind::Text, |r| {
            FieldValue::Text(r.request.host.clone())
        }),
        Column::new("ArgPort", ColumnKind::Integer, |r| {
            FieldValue::Integer(i64::from(r.request.port))
        }),
        Column::new("ArgURL", ColumnKind::Text, |r| {
            FieldValue::Text(r.request.path.clone())
        }),
        Column::new("ArgNumConnections", ColumnKind::Integer, |r| {
            FieldValue::Integer(r.request.num_connections as i64)
        }),
        Column::new("ArgConnectionRate", ColumnKind::Integer, |r| {
            FieldValue::Integer(r.request.connection_rate as i64)
        }),
        Column::new("ArgRequestsPerConnection", ColumnKind::Integer, |r| {
            FieldValue::Integer(i64::from(r.request.requests_per_connection))
        }),
    ]
}

fn metric_columns() -> Vec<Column> {
    vec![
        metric!("ConnectionBurstLength", connection_burst_length),
        metric!("TotalConnections", total_connections),
        metric!("TotalRequests", total_requests),
        metric!("TotalReplies", total_replies),
        metric!("TestDuration", test_duration),
        metric!("ConnectionsPerSecond", connections_per_second),
        metric!("MsPerConnection", ms_per_connection),
        metric!("ConcurrentConnections", concurrent_connections),
        metric!("ConnectionTimeMin", connection_time_min),
        metric!("ConnectionTimeAvg", connection_time_avg),
        metric!("ConnectionTimeMax", connection_time_max),
        metric!("ConnectionTimeMedian", connection_time_median),
        metric!("ConnectionTimeStddev", connection_time_stddev),
        metric!("ConnectionTimeConnect", connection_time_connect),
        metric!("RepliesPerConnection", replies_per_connection),
        metric!("RequestsPerSecond", requests_per_second),
        metric!("MsPerRequest", ms_per_request),
        metric!("RequestSize", request_size),
        metric!("RepliesPerSecMin", replies_per_sec_min),
        metric!("RepliesPerSecAvg", replies_per_sec_avg),
        metric!("RepliesPerSecMax", replies_per_sec_max),
        metric!("RepliesPerSecStddev", replies_per_sec_stddev),
        metric!("RepliesPerSecNumSamples", replies_per_sec_num_samples),
        metric!("ReplyTimeResponse", reply_time_response),
        metric!("ReplyTimeTransfer", reply_time_transfer),
        metric!("ReplySizeHeader", reply_size_header),
        metric!("ReplySizeContent", reply_size_content),
        metric!("ReplySizeFooter", reply_size_footer),
        metric!("ReplySizeTotal", reply_size_total),
        metric!("ReplyStatus_1xx", reply_status_1xx),
        metric!("ReplyStatus_2xx", reply_status_2xx),
        metric!("ReplyStatus_3xx", reply_status_3xx),
        metric!("ReplyStatus_4xx", reply_status_4xx),
        metric!("ReplyStatus_5xx", reply_status_5xx),
        metric!("CpuTimeUser", cpu_time_user),
        metric!("CpuTimeSystem", cpu_time_system),
        metric!("CpuPercUser", cpu_perc_user),
        metric!("CpuPercSystem", cpu_perc_system),
        metric!("CpuPercTotal", cpu_perc_total),
        metric!("NetIOValue", net_io_value),
        metric_text!("NetIOUnit", net_io_unit),
        metric_text!("NetIOBytesPerSecond", net_io_bytes_per_second),
        metric!("ErrTotal", err_total),
        metric!("ErrClientTimeout", err_client_timeout),
        metric!("ErrSocketTimeout", err_socket_timeout),
        metric!("ErrConnectionRefused", err_connection_refused),
        metric!("ErrConnectionReset", err_connection_reset),
        metric!("ErrFdUnavail", err_fd_unavail),
        metric!("ErrAddrUnavail", err_addr_unavail),
        metric!("ErrFtabFull", err_ftab_full),
        metric!("ErrOther", err_other),
    ]
}

/// Columns that may be selected but are not in the standard set
fn optional_columns() -> Vec<Column> {
    vec![
        Column::new("ArgTimeout", ColumnKind::Integer, |r| {
            FieldValue::Integer(r.request.timeout_secs.map(i64::from).unwrap_or(0))
        }),
        metric_text!("Raw", raw),
    ]
}

/// An ordered list of columns
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// The documented column set, in its stable order
    pub fn standard() -> Self {
        let mut columns = provenance_columns();
        columns.extend(metric_columns());
        Self { columns }
    }

    /// Every column that can be selected by name
    pub fn catalogue() -> Self {
        let mut schema = Self::standard();
        schema.columns.extend(optional_columns());
        schema
    }

    /// Build a schema from column names, in the order given
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self, crate::OutputError> {
        if names.is_empty() {
            return Err(crate::OutputError::EmptySchema);
        }

        let catalogue = Self::catalogue();
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                catalogue
                    .columns
                    .iter()
                    .find(|c| c.name == name)
                    .cloned()
                    .ok_or_else(|| crate::OutputError::UnknownColumn {
                        name: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns })
    }

    /// Append a column at the end
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}
