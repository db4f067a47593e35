//! IPC protocol definitions and message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use stampede_core::{BenchmarkRequest, RawReport};

/// IPC protocol version for compatibility checking
pub const IPC_PROTOCOL_VERSION: u32 = 1;

/// Messages sent from the coordinator to a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Run the load generator once with the given parameters
    RunBenchmark {
        correlation_id: Uuid,
        request: BenchmarkRequest,
    },

    /// Health check ping
    Ping { correlation_id: Uuid },

    /// Shutdown signal
    Shutdown,
}

/// Messages sent from a worker back to the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorMessage {
    /// Captured output of a completed run
    BenchmarkReport {
        correlation_id: Uuid,
        report: RawReport,
    },

    /// Health check response
    Pong {
        correlation_id: Uuid,
        worker_id: String,
        status: WorkerStatus,
    },

    /// Worker error
    Error {
        correlation_id: Option<Uuid>,
        error: WorkerError,
    },

    /// Worker ready for work
    Ready { worker_id: String },
}

impl CoordinatorMessage {
    /// Correlation id of a reply, if it carries one
    pub fn correlation_id(&self) -> Option<Uuid> {
        match self {
            CoordinatorMessage::BenchmarkReport { correlation_id, .. }
            | CoordinatorMessage::Pong { correlation_id, .. } => Some(*correlation_id),
            CoordinatorMessage::Error { correlation_id, .. } => *correlation_id,
            CoordinatorMessage::Ready { .. } => None,
        }
    }
}

/// Worker status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub benchmarks_run: u64,
    pub benchmarks_failed: u64,
}

impl WorkerStatus {
    /// Create a new worker status
    pub fn new(worker_id: String, pid: u32) -> Self {
        let now = Utc::now();
        Self {
            worker_id,
            pid,
            started_at: now,
            last_activity: now,
            benchmarks_run: 0,
            benchmarks_failed: 0,
        }
    }

    /// Update activity timestamp
    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Record one load-generator run
    pub fn record_benchmark(&mut self, success: bool) {
        self.benchmarks_run += 1;
        if !success {
            self.benchmarks_failed += 1;
        }
        self.update_activity();
    }
}

/// Worker error types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error_type", rename_all = "snake_case")]
pub enum WorkerError {
    /// The load-generator executable could not be located
    ExecutableNotFound { path: String },

    /// The load generator could not be started or waited on
    LaunchFailed { error: String },

    /// The load generator was terminated abnormally (e.g. by a signal)
    AbnormalExit {
        signal: Option<i32>,
        stderr: String,
    },

    /// Communication error
    CommunicationError { error: String },

    /// Message parse error
    MessageParseError { error: String },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::ExecutableNotFound { path } => {
                write!(f, "Load generator executable not found: {}", path)
            }
            WorkerError::LaunchFailed { error } => {
                write!(f, "Failed to run load generator: {}", error)
            }
            WorkerError::AbnormalExit { signal, .. } => match signal {
                Some(sig) => write!(f, "Load generator killed by signal {}", sig),
                None => write!(f, "Load generator terminated abnormally"),
            },
            WorkerError::CommunicationError { error } => {
                write!(f, "Communication error: {}", error)
            }
            WorkerError::MessageParseError { error } => {
                write!(f, "Message parse error: {}", error)
            }
        }
    }
}

impl std::error::Error for WorkerError {}

/// Message envelope for all IPC communications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope<T> {
    pub protocol_version: u32,
    pub timestamp: DateTime<Utc>,
    pub message: T,
}

impl<T> MessageEnvelope<T> {
    /// Create a new message envelope
    pub fn new(message: T) -> Self {
        Self {
            protocol_version: IPC_PROTOCOL_VERSION,
            timestamp: Utc::now(),
            message,
        }
    }

    /// Check if protocol version is compatible
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == IPC_PROTOCOL_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BenchmarkRequest {
        BenchmarkRequest {
            host: "target.local".to_string(),
            port: 8080,
            path: "/index.html".to_string(),
            num_connections: 3000,
            connection_rate: 200,
            requests_per_connection: 5,
            timeout_secs: Some(5),
            hog: true,
        }
    }

    #[test]
    fn test_worker_status() {
        let mut status = WorkerStatus::new("worker-1".to_string(), 12345);

        assert_eq!(status.worker_id, "worker-1");
        assert_eq!(status.pid, 12345);
        assert_eq!(status.benchmarks_run, 0);

        status.record_benchmark(true);
        assert_eq!(status.benchmarks_run, 1);
        assert_eq!(status.benchmarks_failed, 0);

        status.record_benchmark(false);
        assert_eq!(status.benchmarks_run, 2);
        assert_eq!(status.benchmarks_failed, 1);
    }

    #[test]
    fn test_run_benchmark_wire_format() {
        let correlation_id = Uuid::new_v4();
        let message = WorkerMessage::RunBenchmark {
            correlation_id,
            request: request(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "run_benchmark");
        assert_eq!(json["request"]["num_connections"], 3000);

        let back: WorkerMessage = serde_json::from_value(json).unwrap();
        match back {
            WorkerMessage::RunBenchmark {
                correlation_id: id,
                request: r,
            } => {
                assert_eq!(id, correlation_id);
                assert_eq!(r, request());
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_worker_error_tagging() {
        let error = WorkerError::AbnormalExit {
            signal: Some(9),
            stderr: String::new(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error_type"], "abnormal_exit");
        assert_eq!(error.to_string(), "Load generator killed by signal 9");
    }

    #[test]
    fn test_correlation_id() {
        let id = Uuid::new_v4();
        let report = CoordinatorMessage::BenchmarkReport {
            correlation_id: id,
            report: RawReport::default(),
        };
        assert_eq!(report.correlation_id(), Some(id));

        let ready = CoordinatorMessage::Ready {
            worker_id: "w".to_string(),
        };
        assert_eq!(ready.correlation_id(), None);
    }

    #[test]
    fn test_message_envelope() {
        let message = WorkerMessage::Ping {
            correlation_id: Uuid::new_v4(),
        };

        let envelope = MessageEnvelope::new(message);
        assert_eq!(envelope.protocol_version, IPC_PROTOCOL_VERSION);
        assert!(envelope.is_compatible());

        let json = serde_json::to_string(&envelope).unwrap();
        let deserialized: MessageEnvelope<WorkerMessage> = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.protocol_version, envelope.protocol_version);
    }
}
