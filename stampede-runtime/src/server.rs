//! Worker daemon: accepts coordinator connections and runs their benchmarks

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use stampede_config::WorkerConfig;
use stampede_ipc::{
    CoordinatorMessage, IpcError, IpcTransport, MessageEnvelope, TcpTransport, WorkerError,
    WorkerMessage, WorkerStatus,
};

use crate::error::RuntimeError;
use crate::runner::{BenchmarkRunner, HttperfRunner};

/// Daemon entry point for `stampede worker`. Serves until interrupted.
pub async fn worker_main(config: &WorkerConfig) -> Result<(), RuntimeError> {
    let addr = config.listen_address();
    let listener = bind(&addr).await?;
    let worker_id = config.worker_id.clone().unwrap_or_else(|| addr.clone());

    let server = WorkerServer::new(worker_id, HttperfRunner::from_config(config));
    info!(
        worker_id = %server.worker_id(),
        %addr,
        httperf = %config.httperf_path,
        "Worker listening"
    );

    server
        .serve_until(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for interrupt");
            }
        })
        .await?;

    info!("Worker shutting down");
    Ok(())
}

pub async fn bind(addr: &str) -> Result<TcpListener, RuntimeError> {
    TcpListener::bind(addr).await.map_err(|source| RuntimeError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serves any number of coordinator sessions, one benchmark at a time per
/// session.
pub struct WorkerServer<R> {
    worker_id: String,
    runner: Arc<R>,
    status: Arc<RwLock<WorkerStatus>>,
}

impl<R: BenchmarkRunner + 'static> WorkerServer<R> {
    pub fn new(worker_id: impl Into<String>, runner: R) -> Self {
        let worker_id = worker_id.into();
        Self {
            status: Arc::new(RwLock::new(WorkerStatus::new(
                worker_id.clone(),
                std::process::id(),
            ))),
            worker_id,
            runner: Arc::new(runner),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub async fn status(&self) -> WorkerStatus {
        self.status.read().await.clone()
    }

    /// Accept connections forever
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RuntimeError> {
        loop {
            let (stream, peer) = listener.accept().await.map_err(RuntimeError::Accept)?;
            info!(%peer, "Coordinator connected");

            let session = Session {
                worker_id: self.worker_id.clone(),
                runner: Arc::clone(&self.runner),
                status: Arc::clone(&self.status),
            };

            tokio::spawn(async move {
                match TcpTransport::new(stream) {
                    Ok(transport) => {
                        if let Err(e) = session.run(transport).await {
                            warn!(%peer, error = %e, "Session ended with error");
                        } else {
                            info!(%peer, "Coordinator disconnected");
                        }
                    }
                    Err(e) => warn!(%peer, error = %e, "Failed to set up session"),
                }
            });
        }
    }

    /// Accept connections until `shutdown` completes
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.serve(listener) => result,
            _ = shutdown => Ok(()),
        }
    }
}

struct Session<R> {
    worker_id: String,
    runner: Arc<R>,
    status: Arc<RwLock<WorkerStatus>>,
}

impl<R: BenchmarkRunner> Session<R> {
    async fn run(&self, mut transport: TcpTransport) -> Result<(), RuntimeError> {
        transport
            .send(&MessageEnvelope::new(CoordinatorMessage::Ready {
                worker_id: self.worker_id.clone(),
            }))
            .await?;

        loop {
            let envelope = match transport.receive::<WorkerMessage>().await {
                Ok(envelope) => envelope,
                Err(IpcError::ConnectionClosed) => return Ok(()),
                Err(IpcError::DeserializationError(e)) => {
                    warn!(error = %e, "Discarding malformed message");
                    self.reply_error(&mut transport, WorkerError::MessageParseError { error: e })
                        .await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.status.write().await.update_activity();

            let reply = match envelope.message {
                WorkerMessage::RunBenchmark {
                    correlation_id,
                    request,
                } => {
                    info!(
                        %correlation_id,
                        connections = request.num_connections,
                        rate = request.connection_rate,
                        "Running benchmark"
                    );
                    let result = self.runner.run(&request).await;
                    self.status.write().await.record_benchmark(result.is_ok());

                    match result {
                        Ok(report) => {
                            debug!(%correlation_id, exit_status = report.exit_status, "Benchmark finished");
                            CoordinatorMessage::BenchmarkReport {
                                correlation_id,
                                report,
                            }
                        }
                        Err(error) => {
                            warn!(%correlation_id, %error, "Benchmark failed");
                            CoordinatorMessage::Error {
                                correlation_id: Some(correlation_id),
                                error,
                            }
                        }
                    }
                }
                WorkerMessage::Ping { correlation_id } => CoordinatorMessage::Pong {
                    correlation_id,
                    worker_id: self.worker_id.clone(),
                    status: self.status.read().await.clone(),
                },
                WorkerMessage::Shutdown => {
                    debug!("Coordinator ended the session");
                    transport.close().await?;
                    return Ok(());
                }
            };

            transport.send(&MessageEnvelope::new(reply)).await?;
        }
    }

    async fn reply_error(&self, transport: &mut TcpTransport, error: WorkerError) -> Result<(), RuntimeError> {
        transport
            .send(&MessageEnvelope::new(CoordinatorMessage::Error {
                correlation_id: None,
                error,
            }))
            .await?;
        Ok(())
    }
}
