//! Pieces shared by the manual, stress and magic controllers

use serde::Serialize;
use std::fmt;
use std::io::Write;

use stampede_core::PerformanceRecord;
use stampede_output::TableWriter;

use crate::error::ExecutionError;

/// Where a controller sends each round's records
pub trait RecordSink {
    fn write_round(&mut self, records: &[PerformanceRecord]) -> Result<(), ExecutionError>;
}

impl<W: Write> RecordSink for TableWriter<W> {
    fn write_round(&mut self, records: &[PerformanceRecord]) -> Result<(), ExecutionError> {
        // A run that records nothing still produces a header
        self.write_header()?;
        self.write_records(records)?;
        Ok(())
    }
}

impl RecordSink for Vec<PerformanceRecord> {
    fn write_round(&mut self, records: &[PerformanceRecord]) -> Result<(), ExecutionError> {
        self.extend_from_slice(records);
        Ok(())
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Manual mode always runs exactly one round
    SingleRound,
    /// The stress controller probed its full cooldown after errors appeared
    CooldownExhausted,
    /// The next rate would exceed the configured ceiling
    MaxRateReached,
    /// Most connections were refused twice in a row
    TargetUnreachable,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            EndReason::SingleRound => "single round complete",
            EndReason::CooldownExhausted => "cooldown exhausted",
            EndReason::MaxRateReached => "maximum rate reached",
            EndReason::TargetUnreachable => "target unreachable",
        };
        f.write_str(reason)
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rounds: usize,
    pub untrusted_rounds: usize,
    /// Rate of the last round that was run
    pub final_rate: u64,
    pub end: EndReason,
}
