//! # Stampede Output
//!
//! Renders performance records as a comma-separated table with a stable,
//! documented column order and delivers it to a sink (standard output or a
//! file).
//!
//! ## Example
//!
//! ```rust
//! use stampede_output::{Schema, TableWriter};
//!
//! let mut writer = TableWriter::new(Schema::select(&["BenchmarkId", "ErrTotal"])?, Vec::new())?;
//! writer.write_header()?;
//! let bytes = writer.into_inner()?;
//! assert_eq!(String::from_utf8(bytes).unwrap(), "BenchmarkId,ErrTotal\n");
//! # Ok::<(), stampede_output::OutputError>(())
//! ```

pub mod destinations;
pub mod errors;
pub mod schema;
pub mod writer;

pub use destinations::{
    FilesystemConfig, FilesystemDestination, OutputSink, StdStream, StdioDestination,
};
pub use errors::OutputError;
pub use schema::{Column, ColumnKind, FieldValue, Schema};
pub use writer::TableWriter;

use std::io::Write;

/// Table writer over a boxed sink handle
pub type SinkWriter = TableWriter<Box<dyn Write + Send>>;

/// Open `sink` and prepare a table with either the standard columns or the
/// named subset.
pub fn open_table(sink: &OutputSink, columns: Option<&[String]>) -> Result<SinkWriter, OutputError> {
    let schema = match columns {
        Some(names) => Schema::select(names)?,
        None => Schema::standard(),
    };
    TableWriter::new(schema, sink.open()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_table_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let columns = vec!["ArgHost".to_string(), "TotalReplies".to_string()];

        let mut table = open_table(&OutputSink::file(&path), Some(columns.as_slice())).unwrap();
        table.write_header().unwrap();
        table.flush().unwrap();
        drop(table);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ArgHost,TotalReplies\n"
        );
    }

    #[test]
    fn test_open_table_rejects_unknown_column() {
        let columns = vec!["Latency".to_string()];
        let result = open_table(&OutputSink::stdout(), Some(columns.as_slice()));
        assert!(matches!(result, Err(OutputError::UnknownColumn { .. })));
    }
}
