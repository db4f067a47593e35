//! One-shot benchmark at a fixed connection count and rate

use tracing::info;

use stampede_config::{ManualConfig, TargetConfig};

use crate::controller::{EndReason, RecordSink, RunSummary};
use crate::coordinator::Coordinator;
use crate::error::ExecutionError;

pub struct ManualController {
    config: ManualConfig,
    target: TargetConfig,
}

impl ManualController {
    pub fn new(config: ManualConfig, target: TargetConfig) -> Self {
        Self { config, target }
    }

    pub async fn run<S>(&self, coordinator: &mut Coordinator, sink: &mut S) -> Result<RunSummary, ExecutionError>
    where
        S: RecordSink + ?Sized,
    {
        let request = self
            .target
            .request(self.config.num_connections, self.config.connection_rate);

        let round = coordinator.run_round(&request).await;
        sink.write_round(&round.records)?;

        info!(
            benchmark_id = %round.benchmark_id,
            recorded = round.records.len(),
            trusted = round.trusted,
            "Manual benchmark complete"
        );

        Ok(RunSummary {
            rounds: 1,
            untrusted_rounds: usize::from(!round.trusted),
            final_rate: self.config.connection_rate,
            end: EndReason::SingleRound,
        })
    }
}
