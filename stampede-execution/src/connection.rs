//! Coordinator-side connections to worker daemons

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stampede_core::{BenchmarkRequest, RawReport};
use stampede_ipc::{
    CoordinatorMessage, IpcError, IpcTransport, MessageEnvelope, TcpTransport, WorkerMessage,
    WorkerStatus,
};

use crate::error::ExecutionError;

/// Completion handle for a call that has already been issued.
///
/// Awaiting [`join`](PendingCall::join) blocks only the caller; the call
/// itself makes progress from the moment it is dispatched.
pub struct PendingCall {
    inner: BoxFuture<'static, Result<RawReport, ExecutionError>>,
}

impl PendingCall {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<RawReport, ExecutionError>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Run `future` on its own task so it proceeds while other workers are
    /// being dispatched
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<RawReport, ExecutionError>> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        Self::new(async move {
            handle
                .await
                .map_err(|e| ExecutionError::CallAbandoned(e.to_string()))?
        })
    }

    /// An already-completed call
    pub fn ready(result: Result<RawReport, ExecutionError>) -> Self {
        Self::new(futures::future::ready(result))
    }

    pub async fn join(self) -> Result<RawReport, ExecutionError> {
        self.inner.await
    }
}

/// A live, exclusively owned connection to one worker.
#[async_trait]
pub trait WorkerConnection: Send {
    /// Issue a benchmark call without waiting for its result.
    ///
    /// An error here means the worker could not be reached at all; transport
    /// failures after the call is on the wire surface from
    /// [`PendingCall::join`] instead.
    async fn dispatch(&mut self, request: BenchmarkRequest) -> Result<PendingCall, ExecutionError>;

    /// Release the connection
    async fn close(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
}

type SharedTransport = Arc<Mutex<Option<TcpTransport>>>;

/// TCP client for a remote worker daemon.
///
/// The transport is dropped after any IPC error and re-dialled on the next
/// dispatch, so a worker that restarts between rounds rejoins the fleet.
pub struct TcpWorkerClient {
    addr: String,
    remote_id: String,
    dial_timeout: Duration,
    transport: SharedTransport,
}

impl TcpWorkerClient {
    /// Dial `addr` and wait for the worker's greeting
    pub async fn connect(addr: impl Into<String>, dial_timeout: Duration) -> Result<Self, ExecutionError> {
        let addr = addr.into();
        let (transport, remote_id) = handshake(&addr, dial_timeout).await?;
        info!(worker = %addr, remote_id = %remote_id, "Connected to worker");

        Ok(Self {
            addr,
            remote_id,
            dial_timeout,
            transport: Arc::new(Mutex::new(Some(transport))),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Identifier the worker announced in its greeting
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    /// Ask the worker for its status
    pub async fn ping(&mut self) -> Result<WorkerStatus, ExecutionError> {
        self.ensure_connected().await?;

        let mut slot = self.transport.lock().await;
        let conn = slot.as_mut().ok_or(IpcError::NotConnected)?;
        let correlation_id = Uuid::new_v4();

        let result: Result<WorkerStatus, ExecutionError> = async {
            conn.send(&MessageEnvelope::new(WorkerMessage::Ping { correlation_id }))
                .await?;
            loop {
                let envelope: MessageEnvelope<CoordinatorMessage> = conn.receive().await?;
                match envelope.message {
                    CoordinatorMessage::Pong {
                        correlation_id: id,
                        status,
                        ..
                    } if id == correlation_id => return Ok(status),
                    other => debug!(worker = %self.addr, "Ignoring {:?} while waiting for pong", other),
                }
            }
        }
        .await;

        if matches!(result, Err(ExecutionError::IpcError(_))) {
            *slot = None;
        }
        result
    }

    async fn ensure_connected(&mut self) -> Result<(), ExecutionError> {
        let mut slot = self.transport.lock().await;
        if slot.is_none() {
            warn!(worker = %self.addr, "Connection lost, redialing");
            let (transport, remote_id) = handshake(&self.addr, self.dial_timeout).await?;
            self.remote_id = remote_id;
            *slot = Some(transport);
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerConnection for TcpWorkerClient {
    async fn dispatch(&mut self, request: BenchmarkRequest) -> Result<PendingCall, ExecutionError> {
        self.ensure_connected().await?;

        let transport = Arc::clone(&self.transport);
        let addr = self.addr.clone();
        Ok(PendingCall::spawn(run_call(transport, addr, request)))
    }

    async fn close(&mut self) -> Result<(), ExecutionError> {
        let mut slot = self.transport.lock().await;
        if let Some(mut transport) = slot.take() {
            transport
                .send(&MessageEnvelope::new(WorkerMessage::Shutdown))
                .await?;
            transport.close().await?;
            debug!(worker = %self.addr, "Closed worker connection");
        }
        Ok(())
    }
}

/// Connect and wait for `Ready`, all within `timeout`
async fn handshake(addr: &str, timeout: Duration) -> Result<(TcpTransport, String), ExecutionError> {
    let dial_failed = |source: IpcError| ExecutionError::DialFailed {
        addr: addr.to_string(),
        source,
    };

    let greeting = async {
        let mut transport = TcpTransport::connect(addr).await.map_err(dial_failed)?;
        let envelope: MessageEnvelope<CoordinatorMessage> =
            transport.receive().await.map_err(dial_failed)?;

        match envelope.message {
            CoordinatorMessage::Ready { worker_id } => Ok((transport, worker_id)),
            other => Err(dial_failed(IpcError::UnexpectedMessage {
                expected: "ready",
                actual: format!("{:?}", other),
            })),
        }
    };

    tokio::time::timeout(timeout, greeting)
        .await
        .map_err(|_| ExecutionError::HandshakeTimeout {
            addr: addr.to_string(),
            timeout,
        })?
}

async fn run_call(
    transport: SharedTransport,
    addr: String,
    request: BenchmarkRequest,
) -> Result<RawReport, ExecutionError> {
    let mut slot = transport.lock().await;
    let conn = slot.as_mut().ok_or(IpcError::NotConnected)?;
    let correlation_id = Uuid::new_v4();

    debug!(worker = %addr, %correlation_id, "Sending benchmark request");
    let result = exchange(conn, correlation_id, request).await;

    if let Err(ExecutionError::IpcError(e)) = &result {
        warn!(worker = %addr, error = %e, "Dropping worker connection");
        *slot = None;
    }
    result
}

async fn exchange(
    conn: &mut TcpTransport,
    correlation_id: Uuid,
    request: BenchmarkRequest,
) -> Result<RawReport, ExecutionError> {
    conn.send(&MessageEnvelope::new(WorkerMessage::RunBenchmark {
        correlation_id,
        request,
    }))
    .await?;

    loop {
        let envelope: MessageEnvelope<CoordinatorMessage> = conn.receive().await?;
        match envelope.message {
            CoordinatorMessage::BenchmarkReport {
                correlation_id: id,
                report,
            } if id == correlation_id => return Ok(report),
            CoordinatorMessage::Error {
                correlation_id: Some(id),
                error,
            } if id == correlation_id => return Err(error.into()),
            CoordinatorMessage::Error {
                correlation_id: None,
                error,
            } => return Err(error.into()),
            other => debug!("Ignoring stale {:?}", other.correlation_id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_ipc::WorkerError;
    use tokio::net::TcpListener;

    fn request() -> BenchmarkRequest {
        BenchmarkRequest {
            host: "target".to_string(),
            port: 80,
            path: "/".to_string(),
            num_connections: 100,
            connection_rate: 10,
            requests_per_connection: 1,
            timeout_secs: None,
            hog: false,
        }
    }

    /// Accept one connection, greet, then answer each request with `reply`
    async fn fake_worker<F>(reply: F) -> String
    where
        F: Fn(Uuid) -> CoordinatorMessage + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = TcpTransport::new(stream).unwrap();
            transport
                .send(&MessageEnvelope::new(CoordinatorMessage::Ready {
                    worker_id: "fake".to_string(),
                }))
                .await
                .unwrap();

            while let Ok(envelope) = transport.receive::<WorkerMessage>().await {
                match envelope.message {
                    WorkerMessage::RunBenchmark { correlation_id, .. }
                    | WorkerMessage::Ping { correlation_id } => {
                        transport
                            .send(&MessageEnvelope::new(reply(correlation_id)))
                            .await
                            .unwrap();
                    }
                    WorkerMessage::Shutdown => break,
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_dispatch_and_join() {
        let addr = fake_worker(|correlation_id| CoordinatorMessage::BenchmarkReport {
            correlation_id,
            report: RawReport {
                stdout: "report".to_string(),
                stderr: String::new(),
                exit_status: 0,
            },
        })
        .await;

        let mut client = TcpWorkerClient::connect(addr, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(client.remote_id(), "fake");

        let report = client.dispatch(request()).await.unwrap().join().await.unwrap();
        assert_eq!(report.stdout, "report");

        // The connection is reused for the next round
        let report = client.dispatch(request()).await.unwrap().join().await.unwrap();
        assert_eq!(report.stdout, "report");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_error_is_call_failure() {
        let addr = fake_worker(|correlation_id| CoordinatorMessage::Error {
            correlation_id: Some(correlation_id),
            error: WorkerError::ExecutableNotFound {
                path: "httperf".to_string(),
            },
        })
        .await;

        let mut client = TcpWorkerClient::connect(addr, Duration::from_secs(5))
            .await
            .unwrap();
        let pending = client.dispatch(request()).await.unwrap();
        let err = pending.join().await.unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::WorkerError(WorkerError::ExecutableNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = TcpWorkerClient::connect(addr, Duration::from_secs(2))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ExecutionError::DialFailed { .. }));
    }

    #[tokio::test]
    async fn test_silent_worker_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = TcpWorkerClient::connect(addr, Duration::from_millis(100))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ExecutionError::HandshakeTimeout { .. }));
    }

    #[tokio::test]
    async fn test_ready_pending_call() {
        let call = PendingCall::ready(Ok(RawReport::default()));
        assert_eq!(call.join().await.unwrap(), RawReport::default());
    }
}
