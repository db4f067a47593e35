//! Error types for the output system

use thiserror::Error;

use crate::schema::ColumnKind;

#[derive(Error, Debug)]
pub enum OutputError {
    /// A column's value kind has no textual rendering
    #[error("Column {column} has a value kind the table writer cannot handle: {kind:?}")]
    UnsupportedColumn { column: String, kind: ColumnKind },

    /// An accessor produced a value of a different kind than declared
    #[error("Column {column} declared as {expected:?} produced a {actual:?} value")]
    KindMismatch {
        column: String,
        expected: ColumnKind,
        actual: ColumnKind,
    },

    #[error("Unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("Column set is empty")]
    EmptySchema,

    #[error("Serialization failed for format {format}: {error}")]
    Serialization { format: String, error: String },

    #[error("Filesystem operation failed at {path} ({operation}): {error}")]
    Filesystem {
        path: String,
        operation: String,
        error: String,
    },

    #[error("File already exists: {path}")]
    FileExists { path: String },
}

impl From<csv::Error> for OutputError {
    fn from(err: csv::Error) -> Self {
        OutputError::Serialization {
            format: "csv".to_string(),
            error: err.to_string(),
        }
    }
}

impl OutputError {
    /// Schema problems are configuration errors rather than I/O failures
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            OutputError::UnsupportedColumn { .. }
                | OutputError::KindMismatch { .. }
                | OutputError::UnknownColumn { .. }
                | OutputError::EmptySchema
        )
    }
}
