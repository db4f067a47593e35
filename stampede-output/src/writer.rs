//! Comma-separated table writer

use std::io::Write;

use stampede_core::PerformanceRecord;

use crate::errors::OutputError;
use crate::schema::Schema;

/// Writes one header line and one row per record.
///
/// The schema is checked when the writer is created: a column whose kind
/// cannot be rendered is rejected before anything is written.
pub struct TableWriter<W: Write> {
    schema: Schema,
    inner: csv::Writer<W>,
    header_written: bool,
    rows_written: usize,
}

impl<W: Write> TableWriter<W> {
    pub fn new(schema: Schema, writer: W) -> Result<Self, OutputError> {
        if schema.is_empty() {
            return Err(OutputError::EmptySchema);
        }
        if let Some(column) = schema.columns().iter().find(|c| !c.kind.is_supported()) {
            return Err(OutputError::UnsupportedColumn {
                column: column.name.to_string(),
                kind: column.kind,
            });
        }

        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        Ok(Self {
            schema,
            inner,
            header_written: false,
            rows_written: 0,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the header line; subsequent calls are no-ops
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        if self.header_written {
            return Ok(());
        }
        self.inner.write_record(self.schema.names())?;
        self.inner.flush().map_err(csv::Error::from)?;
        self.header_written = true;
        Ok(())
    }

    /// Write one row. The header is emitted first if it has not been yet.
    pub fn write_record(&mut self, record: &PerformanceRecord) -> Result<(), OutputError> {
        self.write_header()?;

        let mut row = Vec::with_capacity(self.schema.len());
        for column in self.schema.columns() {
            let value = column.value(record);
            if value.kind() != column.kind {
                return Err(OutputError::KindMismatch {
                    column: column.name.to_string(),
                    expected: column.kind,
                    actual: value.kind(),
                });
            }
            let cell = value.render().ok_or_else(|| OutputError::UnsupportedColumn {
                column: column.name.to_string(),
                kind: value.kind(),
            })?;
            row.push(cell);
        }

        self.inner.write_record(&row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write a batch of rows and flush them to the sink
    pub fn write_records(&mut self, records: &[PerformanceRecord]) -> Result<(), OutputError> {
        for record in records {
            self.write_record(record)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.inner.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, OutputError> {
        self.inner
            .into_inner()
            .map_err(|e| OutputError::Serialization {
                format: "csv".to_string(),
                error: e.to_string(),
            })
    }
}
