//! Scripted in-memory workers for exercising the coordinator and controllers

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stampede_core::testing::ReportBuilder;
use stampede_core::{BenchmarkRequest, RatePartition, RawReport};
use stampede_ipc::{IpcError, WorkerError};

use crate::connection::{PendingCall, WorkerConnection};
use crate::coordinator::Coordinator;
use crate::error::ExecutionError;
use crate::worker::WorkerHandle;

/// What a scripted worker does with one dispatch
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Report(RawReport),
    /// The call is issued but fails in flight
    CallFailure(String),
    /// The worker cannot be reached
    DialFailure(String),
    /// The wrapped reply arrives only after the delay
    Delayed(Duration, Box<ScriptedReply>),
}

impl ScriptedReply {
    pub fn report(stdout: impl Into<String>) -> Self {
        ScriptedReply::Report(RawReport {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_status: 0,
        })
    }

    /// A well-formed load-generator report
    pub fn built(builder: &ReportBuilder) -> Self {
        Self::report(builder.build())
    }

    /// A well-formed report that also wrote `stderr`
    pub fn built_with_stderr(builder: &ReportBuilder, stderr: impl Into<String>) -> Self {
        ScriptedReply::Report(RawReport {
            stdout: builder.build(),
            stderr: stderr.into(),
            exit_status: 0,
        })
    }

    pub fn call_failure(reason: impl Into<String>) -> Self {
        ScriptedReply::CallFailure(reason.into())
    }

    pub fn dial_failure(reason: impl Into<String>) -> Self {
        ScriptedReply::DialFailure(reason.into())
    }

    pub fn delayed(delay: Duration, reply: ScriptedReply) -> Self {
        ScriptedReply::Delayed(delay, Box::new(reply))
    }

    fn into_call(self) -> Result<PendingCall, ExecutionError> {
        match self {
            ScriptedReply::Report(report) => Ok(PendingCall::ready(Ok(report))),
            ScriptedReply::CallFailure(error) => Ok(PendingCall::ready(Err(
                WorkerError::CommunicationError { error }.into(),
            ))),
            ScriptedReply::DialFailure(reason) => Err(ExecutionError::DialFailed {
                addr: "scripted".to_string(),
                source: IpcError::IoError(reason),
            }),
            ScriptedReply::Delayed(delay, reply) => {
                let call = reply.into_call()?;
                Ok(PendingCall::spawn(async move {
                    tokio::time::sleep(delay).await;
                    call.join().await
                }))
            }
        }
    }
}

/// Requests a scripted worker has received, shared with the test
pub type RequestLog = Arc<Mutex<Vec<BenchmarkRequest>>>;

/// A worker that answers from a script instead of the network.
///
/// Replies are consumed in order; once the script runs out the `always`
/// reply (if any) repeats, otherwise the call fails.
#[derive(Debug, Default)]
pub struct ScriptedWorker {
    replies: VecDeque<ScriptedReply>,
    fallback: Option<ScriptedReply>,
    requests: RequestLog,
}

impl ScriptedWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, reply: ScriptedReply) -> Self {
        self.replies.push_back(reply);
        self
    }

    pub fn always(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn requests(&self) -> RequestLog {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl WorkerConnection for ScriptedWorker {
    async fn dispatch(&mut self, request: BenchmarkRequest) -> Result<PendingCall, ExecutionError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }

        let reply = self
            .replies
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| ScriptedReply::call_failure("script exhausted"));

        reply.into_call()
    }
}

/// A coordinator over scripted workers named `worker-<n>`
pub fn scripted_coordinator(
    workers: Vec<ScriptedWorker>,
    partition: RatePartition,
) -> Result<Coordinator, ExecutionError> {
    let handles = workers
        .into_iter()
        .enumerate()
        .map(|(index, worker)| {
            WorkerHandle::new(format!("worker-{}", index), index, Box::new(worker))
        })
        .collect();
    Coordinator::new(handles, partition)
}
