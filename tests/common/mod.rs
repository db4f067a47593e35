//! Loopback worker daemons backed by a simulated target server

#![allow(dead_code)]

use async_trait::async_trait;
use std::time::Duration;

use stampede_config::TargetConfig;
use stampede_core::testing::ReportBuilder;
use stampede_core::{BenchmarkRequest, RatePartition, RawReport};
use stampede_execution::{connect_workers, Coordinator};
use stampede_ipc::WorkerError;
use stampede_resilience::RetryPolicy;
use stampede_runtime::{bind, BenchmarkRunner, WorkerServer};

/// Helper to suppress logging output during test execution
pub fn init_quiet_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Stands in for httperf hitting a server with a fixed capacity.
///
/// Reports echo the requested connections and rate. Above `capacity` half of
/// the connections time out; above `refuse_above` every connection is
/// refused.
#[derive(Debug, Clone)]
pub struct SimulatedTarget {
    pub capacity: u64,
    pub refuse_above: Option<u64>,
    pub stderr: String,
}

impl SimulatedTarget {
    pub fn healthy() -> Self {
        Self {
            capacity: u64::MAX,
            refuse_above: None,
            stderr: String::new(),
        }
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            ..Self::healthy()
        }
    }

    pub fn refusing_above(rate: u64) -> Self {
        Self {
            refuse_above: Some(rate),
            ..Self::healthy()
        }
    }
}

#[async_trait]
impl BenchmarkRunner for SimulatedTarget {
    async fn run(&self, request: &BenchmarkRequest) -> Result<RawReport, WorkerError> {
        let mut report = ReportBuilder::new()
            .connections(request.num_connections)
            .connection_rate(request.connection_rate as f64);

        if request.connection_rate > self.capacity {
            report = report.client_timeouts(request.num_connections / 2);
        }
        if self.refuse_above.is_some_and(|limit| request.connection_rate > limit) {
            report = report.connection_refused(request.num_connections);
        }

        Ok(RawReport {
            stdout: report.build(),
            stderr: self.stderr.clone(),
            exit_status: 0,
        })
    }
}

/// A runner whose load generator is missing
pub struct MissingHttperf;

#[async_trait]
impl BenchmarkRunner for MissingHttperf {
    async fn run(&self, _request: &BenchmarkRequest) -> Result<RawReport, WorkerError> {
        Err(WorkerError::ExecutableNotFound {
            path: "httperf".to_string(),
        })
    }
}

/// Start a worker daemon on an ephemeral loopback port
pub async fn spawn_worker<R: BenchmarkRunner + 'static>(worker_id: &str, runner: R) -> String {
    let listener = bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().expect("local addr").to_string();
    let server = WorkerServer::new(worker_id, runner);
    tokio::spawn(async move { server.serve(listener).await });
    addr
}

/// Start `count` daemons that all front the same simulated target
pub async fn spawn_fleet(count: usize, target: SimulatedTarget) -> Vec<String> {
    let mut addrs = Vec::with_capacity(count);
    for index in 0..count {
        addrs.push(spawn_worker(&format!("worker-{}", index), target.clone()).await);
    }
    addrs
}

pub fn quick_dial() -> RetryPolicy {
    RetryPolicy::fixed(2, Duration::from_millis(20))
}

pub async fn coordinator(addrs: &[String], partition: RatePartition) -> Coordinator {
    let workers = connect_workers(addrs, Duration::from_secs(5), quick_dial())
        .await
        .expect("connect to loopback workers");
    Coordinator::new(workers, partition).expect("non-empty fleet")
}

pub fn target() -> TargetConfig {
    TargetConfig {
        host: "app.internal".to_string(),
        port: 8080,
        path: "/health".to_string(),
        ..Default::default()
    }
}
