//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use stampede_config::StampedeConfig;
use stampede_core::RatePartition;
use stampede_output::OutputSink;

#[derive(Parser)]
#[command(name = "stampede", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the worker daemon that executes httperf for coordinators
    Worker {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Port to listen on
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,

        /// Path to the httperf executable
        #[arg(long, value_name = "PATH")]
        httperf: Option<String>,

        /// Name announced to coordinators
        #[arg(long, value_name = "ID")]
        worker_id: Option<String>,
    },

    /// Run a single benchmark round across the workers
    Manual {
        #[command(flatten)]
        run: RunArgs,

        /// Total connections across all workers
        #[arg(long, value_name = "N")]
        connections: Option<u64>,

        /// Connections per second
        #[arg(long, value_name = "N")]
        rate: Option<u64>,
    },

    /// Ramp the connection rate until the target keeps failing
    Stress {
        #[command(flatten)]
        run: RunArgs,

        /// Rate of the first round
        #[arg(long, value_name = "N")]
        starting_rate: Option<u64>,

        /// Error rounds to keep probing after errors first appear
        #[arg(long, value_name = "N")]
        cooldown: Option<u32>,

        /// Errors per round above which the target counts as failing
        #[arg(long, value_name = "N", conflicts_with = "any_error")]
        error_threshold: Option<u64>,

        /// Treat any error as a failing round
        #[arg(long)]
        any_error: bool,

        /// Seconds to wait between rounds
        #[arg(long, value_name = "SECS")]
        round_delay: Option<u64>,

        /// Stop before exceeding this rate
        #[arg(long, value_name = "N")]
        max_rate: Option<u64>,
    },

    /// Unattended ramp that validates and retries each round
    Magic {
        #[command(flatten)]
        run: RunArgs,

        /// Rate of the first round
        #[arg(long, value_name = "N")]
        starting_rate: Option<u64>,

        /// Rate increment after each validated round
        #[arg(long, value_name = "N")]
        step: Option<u64>,

        /// Stop before exceeding this rate
        #[arg(long, value_name = "N")]
        max_rate: Option<u64>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

/// Options shared by the benchmark commands
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Worker addresses (host:port), in dispatch order
    #[arg(value_name = "WORKER")]
    pub workers: Vec<String>,

    /// Target server host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Target server port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Request path
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Requests sent on each connection
    #[arg(long, value_name = "N")]
    pub requests_per_connection: Option<u32>,

    /// Whether workers share the rate (divide) or each run it (replicate)
    #[arg(long, value_name = "MODE")]
    pub rate_partition: Option<RatePartition>,

    /// Write the table to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Comma-separated table columns
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub columns: Option<Vec<String>>,
}

impl RunArgs {
    /// Layer the flags over the loaded configuration
    pub fn apply(&self, config: &mut StampedeConfig) {
        if !self.workers.is_empty() {
            config.coordinator.workers = self.workers.clone();
        }
        if let Some(host) = &self.host {
            config.target.host = host.clone();
        }
        if let Some(port) = self.port {
            config.target.port = port;
        }
        if let Some(path) = &self.path {
            config.target.path = path.clone();
        }
        if let Some(requests) = self.requests_per_connection {
            config.target.requests_per_connection = requests;
        }
        if let Some(partition) = self.rate_partition {
            config.coordinator.rate_partition = partition;
        }
        if let Some(output) = &self.output {
            config.output.sink = OutputSink::file(output);
        }
        if let Some(columns) = &self.columns {
            config.output.columns = Some(columns.clone());
        }
    }
}

impl Commands {
    /// Apply command-specific overrides to the loaded configuration
    pub fn apply(&self, config: &mut StampedeConfig) {
        match self {
            Commands::Worker {
                bind,
                port,
                httperf,
                worker_id,
            } => {
                if let Some(bind) = bind {
                    config.worker.bind_address = bind.clone();
                }
                if let Some(port) = port {
                    config.worker.port = *port;
                }
                if let Some(httperf) = httperf {
                    config.worker.httperf_path = httperf.clone();
                }
                if worker_id.is_some() {
                    config.worker.worker_id = worker_id.clone();
                }
            }
            Commands::Manual {
                run,
                connections,
                rate,
            } => {
                run.apply(config);
                if let Some(connections) = connections {
                    config.manual.num_connections = *connections;
                }
                if let Some(rate) = rate {
                    config.manual.connection_rate = *rate;
                }
            }
            Commands::Stress {
                run,
                starting_rate,
                cooldown,
                error_threshold,
                any_error,
                round_delay,
                max_rate,
            } => {
                run.apply(config);
                if let Some(rate) = starting_rate {
                    config.stress.starting_rate = *rate;
                }
                if let Some(cooldown) = cooldown {
                    config.stress.cooldown = *cooldown;
                }
                if *any_error {
                    config.stress.error_threshold = None;
                } else if error_threshold.is_some() {
                    config.stress.error_threshold = *error_threshold;
                }
                if let Some(delay) = round_delay {
                    config.stress.round_delay = Duration::from_secs(*delay);
                }
                if max_rate.is_some() {
                    config.stress.max_rate = *max_rate;
                }
            }
            Commands::Magic {
                run,
                starting_rate,
                step,
                max_rate,
            } => {
                run.apply(config);
                if let Some(rate) = starting_rate {
                    config.magic.starting_rate = *rate;
                }
                if let Some(step) = step {
                    config.magic.step = *step;
                }
                if max_rate.is_some() {
                    config.magic.max_rate = *max_rate;
                }
            }
            Commands::Config { .. } => {}
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Path to configuration file (optional, uses default loading logic)
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,

        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_stress_flags_override_config() {
        let cli = parse(&[
            "stampede",
            "stress",
            "10.0.0.1:1717",
            "10.0.0.2:1717",
            "--host",
            "target.example",
            "--port",
            "8080",
            "--cooldown",
            "5",
            "--error-threshold",
            "100",
            "--rate-partition",
            "divide",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));

        let mut config = StampedeConfig::default();
        cli.command.unwrap().apply(&mut config);

        assert_eq!(config.coordinator.workers, vec!["10.0.0.1:1717", "10.0.0.2:1717"]);
        assert_eq!(config.target.host, "target.example");
        assert_eq!(config.target.port, 8080);
        assert_eq!(config.stress.cooldown, 5);
        assert_eq!(config.stress.error_threshold, Some(100));
        assert_eq!(config.coordinator.rate_partition, RatePartition::Divide);
    }

    #[test]
    fn test_any_error_clears_threshold() {
        let cli = parse(&["stampede", "stress", "w:1717", "--any-error"]);
        let mut config = StampedeConfig::default();
        cli.command.unwrap().apply(&mut config);
        assert_eq!(config.stress.error_threshold, None);
    }

    #[test]
    fn test_threshold_and_any_error_conflict() {
        let result = Cli::try_parse_from([
            "stampede",
            "stress",
            "--any-error",
            "--error-threshold",
            "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_manual_output_and_columns() {
        let cli = parse(&[
            "stampede",
            "manual",
            "w:1717",
            "--connections",
            "1000",
            "--rate",
            "50",
            "--output",
            "/tmp/run.csv",
            "--columns",
            "BenchmarkId,ErrTotal",
        ]);
        let mut config = StampedeConfig::default();
        cli.command.unwrap().apply(&mut config);

        assert_eq!(config.manual.num_connections, 1000);
        assert_eq!(config.manual.connection_rate, 50);
        assert_eq!(config.output.sink, OutputSink::file("/tmp/run.csv"));
        assert_eq!(
            config.output.columns,
            Some(vec!["BenchmarkId".to_string(), "ErrTotal".to_string()])
        );
    }

    #[test]
    fn test_workers_from_config_kept_without_positionals() {
        let cli = parse(&["stampede", "magic", "--step", "10"]);
        let mut config = StampedeConfig::default();
        config.coordinator.workers = vec!["cfg:1717".to_string()];
        cli.command.unwrap().apply(&mut config);

        assert_eq!(config.coordinator.workers, vec!["cfg:1717"]);
        assert_eq!(config.magic.step, 10);
    }

    #[test]
    fn test_worker_flags() {
        let cli = parse(&["stampede", "worker", "--port", "9000", "--worker-id", "rack-1"]);
        let mut config = StampedeConfig::default();
        cli.command.unwrap().apply(&mut config);

        assert_eq!(config.worker.port, 9000);
        assert_eq!(config.worker.worker_id.as_deref(), Some("rack-1"));
    }
}
