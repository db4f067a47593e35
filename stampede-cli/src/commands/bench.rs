//! manual, stress and magic commands

use anyhow::{Context, Result};
use tracing::{info, warn};

use stampede_config::StampedeConfig;
use stampede_execution::{
    connect_workers, Coordinator, ExecutionError, MagicController, ManualController, RunSummary,
    StressController,
};
use stampede_output::{open_table, SinkWriter};

/// Connected fleet plus the table the run writes to
struct Bench {
    coordinator: Coordinator,
    table: SinkWriter,
}

impl Bench {
    async fn prepare(config: &StampedeConfig) -> Result<Self> {
        let coordinator_config = &config.coordinator;
        if coordinator_config.workers.is_empty() {
            anyhow::bail!("No workers configured. Pass worker addresses or set coordinator.workers");
        }

        // Open the sink first so a bad column list fails before any dialling
        let table = open_table(&config.output.sink, config.output.columns.as_deref())
            .context("Failed to open output table")?;

        let workers = connect_workers(
            &coordinator_config.workers,
            coordinator_config.dial_timeout,
            coordinator_config.dial_retry.clone(),
        )
        .await
        .context("Failed to connect to workers")?;

        let coordinator = Coordinator::new(workers, coordinator_config.rate_partition)?;
        info!(
            workers = coordinator.worker_count(),
            rate_partition = %coordinator.partition(),
            target = %format!("{}:{}{}", config.target.host, config.target.port, config.target.path),
            "Workers ready"
        );

        Ok(Self { coordinator, table })
    }

    /// Flush output and release workers whatever the run's outcome
    async fn finish(mut self, result: Result<RunSummary, ExecutionError>) -> Result<()> {
        let flushed = self.table.flush().context("Failed to flush output table");
        self.coordinator.shutdown().await;

        let summary = result.context("Benchmark run failed")?;
        flushed?;

        if summary.untrusted_rounds > 0 {
            warn!(
                untrusted_rounds = summary.untrusted_rounds,
                "Some rounds were missing worker results"
            );
        }
        info!(
            rounds = summary.rounds,
            final_rate = summary.final_rate,
            end = %summary.end,
            rows = self.table.rows_written(),
            "Run complete"
        );
        Ok(())
    }
}

pub async fn run_manual(config: &StampedeConfig) -> Result<()> {
    let mut bench = Bench::prepare(config).await?;
    let controller = ManualController::new(config.manual.clone(), config.target.clone());
    let result = controller.run(&mut bench.coordinator, &mut bench.table).await;
    bench.finish(result).await
}

pub async fn run_stress(config: &StampedeConfig) -> Result<()> {
    let mut bench = Bench::prepare(config).await?;
    let controller = StressController::new(config.stress.clone(), config.target.clone());
    let result = controller.run(&mut bench.coordinator, &mut bench.table).await;
    bench.finish(result).await
}

pub async fn run_magic(config: &StampedeConfig) -> Result<()> {
    let mut bench = Bench::prepare(config).await?;
    let controller = MagicController::new(config.magic.clone(), config.target.clone());
    let result = controller.run(&mut bench.coordinator, &mut bench.table).await;
    bench.finish(result).await
}
