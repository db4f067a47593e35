//! Manual, stress and magic runs end to end
//!
//! Controllers drive loopback worker daemons and write their table to a
//! temporary file, the way `stampede manual|stress|magic --output` does.

mod common;

use std::time::Duration;
use tempfile::TempDir;

use common::{coordinator, init_quiet_logging, spawn_fleet, target, SimulatedTarget};
use stampede_config::{Breakpoint, MagicConfig, ManualConfig, StressConfig};
use stampede_core::{PerformanceRecord, RatePartition};
use stampede_execution::{EndReason, MagicController, ManualController, StressController};
use stampede_output::{open_table, OutputSink};

fn read_table(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_manual_run_writes_one_row_per_worker() {
    init_quiet_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("manual.csv");

    let addrs = spawn_fleet(2, SimulatedTarget::healthy()).await;
    let mut coordinator = coordinator(&addrs, RatePartition::Divide).await;
    let cols = columns(&["ArgNumConnections", "ArgConnectionRate", "TotalConnections"]);
    let mut table = open_table(&OutputSink::file(&path), Some(cols.as_slice())).unwrap();

    let controller = ManualController::new(
        ManualConfig {
            num_connections: 1000,
            connection_rate: 100,
        },
        target(),
    );
    let summary = controller.run(&mut coordinator, &mut table).await.unwrap();
    table.flush().unwrap();
    drop(table);
    coordinator.shutdown().await;

    assert_eq!(summary.end, EndReason::SingleRound);
    assert_eq!(
        read_table(&path),
        vec![
            "ArgNumConnections,ArgConnectionRate,TotalConnections",
            "500,50,500",
            "500,50,500",
        ]
    );
}

#[tokio::test]
async fn test_stress_run_stops_after_cooldown() {
    init_quiet_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stress.csv");

    // Errors start once the rate passes 100/s
    let addrs = spawn_fleet(2, SimulatedTarget::with_capacity(100)).await;
    let mut coordinator = coordinator(&addrs, RatePartition::Replicate).await;
    let cols = columns(&["ArgConnectionRate", "ErrTotal"]);
    let mut table = open_table(&OutputSink::file(&path), Some(cols.as_slice())).unwrap();

    let controller = StressController::new(
        StressConfig {
            starting_rate: 25,
            initial_step: 25,
            schedule: vec![Breakpoint::new(0, 25)],
            round_duration_secs: 1,
            error_threshold: None,
            cooldown: 1,
            round_delay: Duration::ZERO,
            max_rate: None,
        },
        target(),
    );
    let summary = controller.run(&mut coordinator, &mut table).await.unwrap();
    table.flush().unwrap();
    drop(table);
    coordinator.shutdown().await;

    // 25..100 clean, 125 triggers, 150 and 175 spend the cooldown
    assert_eq!(summary.end, EndReason::CooldownExhausted);
    assert_eq!(summary.rounds, 7);
    assert_eq!(summary.final_rate, 175);
    assert_eq!(summary.untrusted_rounds, 0);

    let lines = read_table(&path);
    assert_eq!(lines.len(), 1 + 7 * 2);
    assert_eq!(lines[0], "ArgConnectionRate,ErrTotal");
    assert_eq!(lines[1], "25,0");
    // 1s * 125/s * 2 workers, 125 each, half of them timing out
    assert_eq!(lines[9], "125,62");
}

#[tokio::test]
async fn test_magic_run_ends_when_target_refuses() {
    init_quiet_logging();
    let addrs = spawn_fleet(2, SimulatedTarget::refusing_above(75)).await;
    let mut coordinator = coordinator(&addrs, RatePartition::Replicate).await;
    let mut records: Vec<PerformanceRecord> = Vec::new();

    let controller = MagicController::new(
        MagicConfig {
            starting_rate: 25,
            step: 25,
            round_duration_secs: 1,
            round_delay: Duration::ZERO,
            ..Default::default()
        },
        target(),
    );
    let summary = controller.run(&mut coordinator, &mut records).await.unwrap();
    coordinator.shutdown().await;

    // 25, 50, 75 validated; 100 refused, retried once, then over
    assert_eq!(summary.end, EndReason::TargetUnreachable);
    assert_eq!(summary.rounds, 5);
    assert_eq!(summary.final_rate, 100);
    assert_eq!(records.len(), 10);
    assert!(records[6..].iter().all(|r| r.metrics.err_connection_refused > 0.0));
}

#[tokio::test]
async fn test_magic_run_respects_ceiling() {
    init_quiet_logging();
    let addrs = spawn_fleet(3, SimulatedTarget::healthy()).await;
    let mut coordinator = coordinator(&addrs, RatePartition::Replicate).await;
    let mut records: Vec<PerformanceRecord> = Vec::new();

    let controller = MagicController::new(
        MagicConfig {
            starting_rate: 50,
            step: 50,
            round_duration_secs: 1,
            round_delay: Duration::ZERO,
            max_rate: Some(150),
            ..Default::default()
        },
        target(),
    );
    let summary = controller.run(&mut coordinator, &mut records).await.unwrap();
    coordinator.shutdown().await;

    assert_eq!(summary.end, EndReason::MaxRateReached);
    assert_eq!(summary.rounds, 3);
    assert_eq!(records.len(), 9);
}
