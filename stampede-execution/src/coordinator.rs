//! Fan-out of one logical request over the worker fleet

use tracing::{debug, info, warn};

use stampede_core::{
    parse_report, BenchmarkId, BenchmarkRequest, PerformanceRecord, RatePartition, StampedeError,
};

use crate::error::ExecutionError;
use crate::worker::WorkerHandle;

/// Non-empty stderr text a worker returned this round
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerDiagnostic {
    pub worker_id: String,
    pub stderr: String,
}

/// How a single worker fared in a round
#[derive(Debug)]
pub enum WorkerOutcome {
    Recorded { worker_id: String },
    Failed(StampedeError),
}

/// Everything a round produced.
///
/// `records` follow the configured worker order. `trusted` is false as soon
/// as any worker failed to contribute a record.
#[derive(Debug)]
pub struct RoundResult {
    pub benchmark_id: BenchmarkId,
    pub request: BenchmarkRequest,
    pub records: Vec<PerformanceRecord>,
    pub trusted: bool,
    pub diagnostics: Vec<WorkerDiagnostic>,
    pub outcomes: Vec<WorkerOutcome>,
}

impl RoundResult {
    pub fn failures(&self) -> impl Iterator<Item = &StampedeError> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            WorkerOutcome::Failed(err) => Some(err),
            WorkerOutcome::Recorded { .. } => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// The round-level fault for an untrusted round
    pub fn untrusted(&self) -> Option<StampedeError> {
        (!self.trusted).then(|| StampedeError::RoundUntrusted {
            benchmark_id: self.benchmark_id,
            failures: self.failure_count(),
        })
    }

    /// Connections the recorded workers were asked to open
    pub fn requested_connections(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.request.num_connections as f64)
            .sum()
    }

    /// Connection-refused errors across the recorded workers
    pub fn refused_connections(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.metrics.err_connection_refused)
            .sum()
    }

    pub fn total_errors(&self) -> f64 {
        stampede_core::total_errors(&self.records)
    }
}

/// Splits requests over the fleet, dispatches them, and joins the results.
#[derive(Debug)]
pub struct Coordinator {
    workers: Vec<WorkerHandle>,
    partition: RatePartition,
}

impl Coordinator {
    pub fn new(workers: Vec<WorkerHandle>, partition: RatePartition) -> Result<Self, ExecutionError> {
        if workers.is_empty() {
            return Err(ExecutionError::NoWorkers);
        }
        Ok(Self { workers, partition })
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn partition(&self) -> RatePartition {
        self.partition
    }

    /// Run one round. Per-worker failures are folded into the result and
    /// never abort the round.
    pub async fn run_round(&mut self, request: &BenchmarkRequest) -> RoundResult {
        let benchmark_id = BenchmarkId::new();
        let share = request.split(self.workers.len(), self.partition);

        info!(
            %benchmark_id,
            workers = self.workers.len(),
            rate = request.connection_rate,
            connections = request.num_connections,
            "Distributing benchmark"
        );
        debug!(?share, "Per-worker request");
        if request.starves_workers(self.workers.len(), self.partition) {
            warn!(
                %benchmark_id,
                rate = request.connection_rate,
                workers = self.workers.len(),
                "Divided connection rate is zero; workers will run with --rate 0"
            );
        }

        // Fan out: every call is issued before any result is awaited
        let mut dispatch_errors = Vec::with_capacity(self.workers.len());
        for worker in self.workers.iter_mut() {
            let outcome = worker.dispatch(share.clone()).await.err();
            if let Some(err) = &outcome {
                warn!(worker_id = %worker.id(), error = %err, "Failed to open connection");
            }
            dispatch_errors.push(outcome);
        }

        // Fan in, in configured order
        let mut records = Vec::with_capacity(self.workers.len());
        let mut diagnostics = Vec::new();
        let mut outcomes = Vec::with_capacity(self.workers.len());

        for (worker, dispatch_error) in self.workers.iter_mut().zip(dispatch_errors) {
            let worker_id = worker.id().to_string();

            if let Some(err) = dispatch_error {
                outcomes.push(WorkerOutcome::Failed(StampedeError::Dial {
                    worker_id,
                    reason: err.to_string(),
                }));
                continue;
            }

            let report = match worker.join().await {
                Some(Ok(report)) => report,
                Some(Err(err)) => {
                    warn!(worker_id = %worker_id, error = %err, "Error state reported");
                    outcomes.push(WorkerOutcome::Failed(StampedeError::Call {
                        worker_id,
                        reason: err.to_string(),
                    }));
                    continue;
                }
                None => {
                    outcomes.push(WorkerOutcome::Failed(StampedeError::Call {
                        worker_id,
                        reason: "no call in flight".to_string(),
                    }));
                    continue;
                }
            };
            debug!(worker_id = %worker_id, exit_status = report.exit_status, "Got results");

            if report.has_diagnostics() {
                warn!(worker_id = %worker_id, stderr = %report.stderr.trim(), "Worker wrote diagnostics");
                diagnostics.push(WorkerDiagnostic {
                    worker_id: worker_id.clone(),
                    stderr: report.stderr.clone(),
                });
            }
            if report.exit_status != 0 {
                warn!(worker_id = %worker_id, exit_status = report.exit_status, "Load generator exited with non-zero status");
            }

            match parse_report(&report.stdout) {
                Ok(metrics) => {
                    let sent = worker.last_request().cloned().unwrap_or_else(|| share.clone());
                    let dispatched_at = worker.dispatched_at().unwrap_or_default();
                    records.push(PerformanceRecord::new(benchmark_id, dispatched_at, sent, metrics));
                    outcomes.push(WorkerOutcome::Recorded { worker_id });
                }
                Err(source) => {
                    warn!(worker_id = %worker_id, error = %source, "Discarding unparseable report");
                    outcomes.push(WorkerOutcome::Failed(StampedeError::Parse { worker_id, source }));
                }
            }
        }

        let trusted = outcomes
            .iter()
            .all(|outcome| matches!(outcome, WorkerOutcome::Recorded { .. }));
        if !trusted {
            warn!(%benchmark_id, recorded = records.len(), "Round results cannot be trusted");
        }

        RoundResult {
            benchmark_id,
            request: request.clone(),
            records,
            trusted,
            diagnostics,
            outcomes,
        }
    }

    /// Close every worker connection, logging failures
    pub async fn shutdown(&mut self) {
        for worker in self.workers.iter_mut() {
            if let Err(e) = worker.close().await {
                warn!(worker_id = %worker.id(), error = %e, "Failed to close worker connection");
            }
        }
    }
}
