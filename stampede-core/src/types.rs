//! Core type definitions for Stampede

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one benchmark round (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkId(pub Uuid);

impl BenchmarkId {
    /// Create a new random benchmark ID
    pub fn new() -> Self {
        BenchmarkId(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BenchmarkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BenchmarkId {
    fn from(uuid: Uuid) -> Self {
        BenchmarkId(uuid)
    }
}

/// How the target connection rate is handed to each worker.
///
/// Whether the load generator interprets `--rate` as a global or a
/// per-process figure depends on the deployment, so both are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RatePartition {
    /// Every worker receives the full target rate
    #[default]
    Replicate,
    /// The target rate is floor-divided across workers
    Divide,
}

impl RatePartition {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatePartition::Replicate => "replicate",
            RatePartition::Divide => "divide",
        }
    }
}

impl fmt::Display for RatePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RatePartition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replicate" => Ok(RatePartition::Replicate),
            "divide" => Ok(RatePartition::Divide),
            _ => Err(format!("Invalid rate partition: {}", s)),
        }
    }
}

/// Parameters of one load-generator run.
///
/// A logical request is built by a controller and then sub-divided once per
/// worker per round; the per-worker copy is what travels over the wire and
/// what gets echoed into the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub num_connections: u64,
    pub connection_rate: u64,
    pub requests_per_connection: u32,
    /// Seconds before a request is considered unfulfilled
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    /// Run the load generator in aggressive (`--hog`) mode
    #[serde(default)]
    pub hog: bool,
}

impl BenchmarkRequest {
    /// Derive the share of this request that a single worker runs.
    ///
    /// Connection counts are floor-divided and the remainder is dropped, so
    /// the fleet runs `N - (N mod W)` connections in total. The rate is
    /// divided or replicated according to `partition`.
    pub fn split(&self, worker_count: usize, partition: RatePartition) -> BenchmarkRequest {
        let workers = worker_count.max(1) as u64;
        let connection_rate = match partition {
            RatePartition::Replicate => self.connection_rate,
            RatePartition::Divide => self.connection_rate / workers,
        };

        BenchmarkRequest {
            num_connections: self.num_connections / workers,
            connection_rate,
            ..self.clone()
        }
    }

    /// True when dividing a non-zero rate leaves each worker with rate 0
    pub fn starves_workers(&self, worker_count: usize, partition: RatePartition) -> bool {
        partition == RatePartition::Divide
            && self.connection_rate > 0
            && self.split(worker_count, partition).connection_rate == 0
    }
}

/// Unparsed output of one load-generator run as captured by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawReport {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl RawReport {
    /// Whether the worker produced any diagnostic output
    pub fn has_diagnostics(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}
