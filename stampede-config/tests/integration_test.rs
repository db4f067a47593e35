//! Integration tests for stampede-config

use stampede_config::*;
use stampede_core::RatePartition;
use stampede_output::OutputSink;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = StampedeConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("STAMPEDE_TARGET_HOST", Some("bench-target.lan")),
        ("STAMPEDE_TARGET_PORT", Some("8080")),
        ("STAMPEDE_WORKERS", Some("10.0.0.1:1717, 10.0.0.2:1717")),
        ("STAMPEDE_RATE_PARTITION", Some("divide")),
        ("STAMPEDE_STRESS_COOLDOWN", Some("5")),
        ("STAMPEDE_STRESS_ERROR_THRESHOLD", Some("any")),
        ("STAMPEDE_STRESS_ROUND_DELAY", Some("1")),
        ("STAMPEDE_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let loader = ConfigLoader::new();
        let config = loader.from_env().unwrap();

        assert_eq!(config.target.host, "bench-target.lan");
        assert_eq!(config.target.port, 8080);
        assert_eq!(
            config.coordinator.workers,
            vec!["10.0.0.1:1717".to_string(), "10.0.0.2:1717".to_string()]
        );
        assert_eq!(config.coordinator.rate_partition, RatePartition::Divide);
        assert_eq!(config.stress.cooldown, 5);
        assert_eq!(config.stress.error_threshold, None);
        assert_eq!(config.stress.round_delay, Duration::from_secs(1));
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_value() {
    with_vars(vec![("STAMPEDE_TARGET_PORT", Some("eighty"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
        assert!(err.to_string().contains("TARGET_PORT"));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("BENCH_MAGIC_STEP", Some("50"))], || {
        let config = ConfigLoader::with_prefix("BENCH").from_env().unwrap();
        assert_eq!(config.magic.step, 50);
    });
}

#[test]
fn test_yaml_config_serialization() {
    let config = StampedeConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();

    let parsed: StampedeConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
    assert!(parsed.validate_all().is_ok());
}

#[test]
fn test_comprehensive_config() {
    let yaml = r#"
target:
  host: "www.example.test"
  port: 8080
  path: "/static/logo.png"
  requests_per_connection: 1
  timeout_secs: 2

coordinator:
  workers: ["bench-1:1717", "bench-2:1717", "bench-3:1717"]
  rate_partition: divide
  dial_timeout: 4
  dial_retry:
    max_attempts: 5
    initial_delay: 1s
    max_delay: 8s
    backoff_strategy:
      type: linear

stress:
  starting_rate: 50
  schedule:
    - { rate: 0, step: 50 }
    - { rate: 1000, step: 10 }
  error_threshold: 100
  cooldown: 2
  round_delay: 10

magic:
  step: 10
  rate_deviation_ratio: 0.1
  exhaustion_backoff: 60
  max_rate: 2000

output:
  sink:
    file:
      path: "/tmp/stampede/results.csv"
  columns: [BenchmarkId, ArgConnectionRate, ConnectionsPerSecond, ErrTotal]

logging:
  level: warn
  format: json
"#;

    let config: StampedeConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate_all().is_ok());

    assert_eq!(config.target.port, 8080);
    assert_eq!(config.target.timeout_secs, Some(2));
    assert!(config.target.hog);
    assert_eq!(config.coordinator.workers.len(), 3);
    assert_eq!(config.coordinator.dial_retry.max_attempts, 5);
    assert_eq!(
        config.coordinator.dial_retry.delay_for_attempt(3),
        Duration::from_secs(3)
    );
    assert_eq!(config.stress.schedule[1], Breakpoint::new(1000, 10));
    assert_eq!(config.stress.initial_step, 25);
    assert_eq!(config.magic.exhaustion_backoff, Duration::from_secs(60));
    assert_eq!(config.magic.max_rate, Some(2000));
    assert_eq!(config.output.sink, OutputSink::file("/tmp/stampede/results.csv"));
    assert_eq!(config.output.schema().unwrap().len(), 4);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.manual, ManualConfig::default());
}

#[test]
fn test_validation_failures_name_domain() {
    let mut config = StampedeConfig::default();
    config.magic.refusal_ratio = 2.0;
    let err = config.validate_all().unwrap_err();
    assert_eq!(err.domain(), Some("magic"));

    let mut config = StampedeConfig::default();
    config.stress.max_rate = Some(1);
    let err = config.validate_all().unwrap_err();
    assert_eq!(err.domain(), Some("stress"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "manual:\n  num_connections: 1200\n  connection_rate: 40").unwrap();

    with_vars(vec![("STAMPEDE_TARGET_HOST", None::<&str>)], || {
        let config = ConfigLoader::new().load(Some(file.path())).unwrap();
        assert_eq!(config.manual.num_connections, 1200);
        assert_eq!(config.manual.connection_rate, 40);
        assert_eq!(config.target.host, "localhost");
    });
}

#[test]
fn test_generate_sample_is_loadable() {
    let sample = StampedeConfig::generate_sample();
    let parsed: StampedeConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
}
