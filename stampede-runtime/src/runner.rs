//! Load-generator execution on the worker host

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

use stampede_config::WorkerConfig;
use stampede_core::{BenchmarkRequest, RawReport};
use stampede_ipc::WorkerError;

/// Runs one benchmark and captures what the load generator printed
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    async fn run(&self, request: &BenchmarkRequest) -> Result<RawReport, WorkerError>;
}

/// Invokes `httperf` as a child process
#[derive(Debug, Clone)]
pub struct HttperfRunner {
    program: PathBuf,
}

impl HttperfRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(&config.httperf_path)
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Command-line arguments for one request
    pub fn args(request: &BenchmarkRequest) -> Vec<String> {
        let mut args = vec![
            "--server".to_string(),
            request.host.clone(),
            "--port".to_string(),
            request.port.to_string(),
            "--uri".to_string(),
            request.path.clone(),
            "--num-conns".to_string(),
            request.num_connections.to_string(),
            "--rate".to_string(),
            request.connection_rate.to_string(),
            "--num-calls".to_string(),
            request.requests_per_connection.to_string(),
        ];

        if let Some(timeout) = request.timeout_secs {
            args.push("--timeout".to_string());
            args.push(timeout.to_string());
        }
        if request.hog {
            args.push("--hog".to_string());
        }

        args
    }
}

#[async_trait]
impl BenchmarkRunner for HttperfRunner {
    async fn run(&self, request: &BenchmarkRequest) -> Result<RawReport, WorkerError> {
        let args = Self::args(request);
        debug!(program = %self.program.display(), ?args, "Running load generator");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => WorkerError::ExecutableNotFound {
                    path: self.program.display().to_string(),
                },
                _ => WorkerError::LaunchFailed {
                    error: e.to_string(),
                },
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // No exit code means the process was killed
        let Some(exit_status) = output.status.code() else {
            let signal = terminating_signal(&output.status);
            warn!(?signal, "Load generator terminated abnormally");
            return Err(WorkerError::AbnormalExit { signal, stderr });
        };

        Ok(RawReport {
            stdout,
            stderr,
            exit_status,
        })
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
