//! Worker handles owned by the coordinator

use std::time::Duration;
use tracing::{debug, info, warn};

use stampede_core::{unix_timestamp, BenchmarkRequest, RawReport};
use stampede_resilience::{RetryExecutor, RetryPolicy};

use crate::connection::{PendingCall, TcpWorkerClient, WorkerConnection};
use crate::error::ExecutionError;

/// One worker in the fleet.
///
/// The connection lives for the whole run. Everything else is per-round
/// state, overwritten by the next dispatch.
pub struct WorkerHandle {
    addr: String,
    id: String,
    connection: Box<dyn WorkerConnection>,
    last_request: Option<BenchmarkRequest>,
    pending: Option<PendingCall>,
    dispatched_at: Option<i64>,
    last_result: Option<RawReport>,
}

impl WorkerHandle {
    /// `index` is the worker's position in the configured list
    pub fn new(addr: impl Into<String>, index: usize, connection: Box<dyn WorkerConnection>) -> Self {
        let addr = addr.into();
        Self {
            id: format!("{}:{}", addr, index),
            addr,
            connection,
            last_request: None,
            pending: None,
            dispatched_at: None,
            last_result: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The share of the round request this worker was last given
    pub fn last_request(&self) -> Option<&BenchmarkRequest> {
        self.last_request.as_ref()
    }

    /// UNIX time of the last dispatch
    pub fn dispatched_at(&self) -> Option<i64> {
        self.dispatched_at
    }

    /// The last report received, if the last call completed
    pub fn last_result(&self) -> Option<&RawReport> {
        self.last_result.as_ref()
    }

    /// Start a call; on error the worker sits this round out
    pub(crate) async fn dispatch(&mut self, request: BenchmarkRequest) -> Result<(), ExecutionError> {
        self.pending = None;
        self.last_result = None;
        self.dispatched_at = Some(unix_timestamp());
        self.last_request = Some(request.clone());

        let call = self.connection.dispatch(request).await?;
        self.pending = Some(call);
        debug!(worker_id = %self.id, "Requested benchmark");
        Ok(())
    }

    /// Wait for the pending call, if one was issued this round
    pub(crate) async fn join(&mut self) -> Option<Result<RawReport, ExecutionError>> {
        let call = self.pending.take()?;
        let result = call.join().await;
        if let Ok(report) = &result {
            self.last_result = Some(report.clone());
        }
        Some(result)
    }

    pub async fn close(&mut self) -> Result<(), ExecutionError> {
        self.connection.close().await
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("dispatched_at", &self.dispatched_at)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

/// Dial every address in order, retrying each according to `policy`.
///
/// Any worker that stays unreachable fails the whole start-up.
pub async fn connect_workers(
    addrs: &[String],
    dial_timeout: Duration,
    policy: RetryPolicy,
) -> Result<Vec<WorkerHandle>, ExecutionError> {
    if addrs.is_empty() {
        return Err(ExecutionError::NoWorkers);
    }

    let mut workers = Vec::with_capacity(addrs.len());
    for (index, addr) in addrs.iter().enumerate() {
        info!("Opening connection to {}", addr);
        let client = RetryExecutor::new(policy.clone())
            .named(format!("dial {}", addr))
            .execute(|| TcpWorkerClient::connect(addr.as_str(), dial_timeout))
            .await
            .map_err(|e| {
                warn!("Could not connect to worker {}", addr);
                e.into_inner()
            })?;

        workers.push(WorkerHandle::new(addr.clone(), index, Box::new(client)));
    }

    Ok(workers)
}
