//! Unattended ramp that validates every round before advancing
//!
//! Each round passes through four gates in order: collection, rate
//! consistency, environment exhaustion and refusal rate. A failing gate gets
//! one retry of the same round; failing the same gate again ends the run.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use stampede_config::{MagicConfig, TargetConfig};
use stampede_core::stats::{mean, std_dev};
use stampede_core::StampedeError;

use crate::controller::{EndReason, RecordSink, RunSummary};
use crate::coordinator::{Coordinator, RoundResult};
use crate::error::ExecutionError;

/// Fault classes that get a single retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    Collection,
    RateInconsistency,
    Exhaustion,
    Refusal,
}

/// One flag per fault class, set while a retry for that class is pending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryFlags {
    pub collection: bool,
    pub rate_inconsistency: bool,
    pub exhaustion: bool,
    pub refusal: bool,
}

impl RetryFlags {
    fn flag_mut(&mut self, fault: FaultClass) -> &mut bool {
        match fault {
            FaultClass::Collection => &mut self.collection,
            FaultClass::RateInconsistency => &mut self.rate_inconsistency,
            FaultClass::Exhaustion => &mut self.exhaustion,
            FaultClass::Refusal => &mut self.refusal,
        }
    }

    /// Set the flag, returning whether it was already set
    fn raise(&mut self, fault: FaultClass) -> bool {
        std::mem::replace(self.flag_mut(fault), true)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What to do after a round
#[derive(Debug)]
pub enum Verdict {
    /// Every gate passed; move to the next rate
    Advance,
    /// Run the same round again, optionally after a backoff
    Retry {
        fault: FaultClass,
        reason: StampedeError,
        backoff: Option<Duration>,
    },
    /// The same fault repeated; stop with an error
    Abort(StampedeError),
    /// Refusals persisted; the target is down and the test is over
    TargetUnreachable(StampedeError),
}

pub struct MagicController {
    config: MagicConfig,
    target: TargetConfig,
}

impl MagicController {
    pub fn new(config: MagicConfig, target: TargetConfig) -> Self {
        Self { config, target }
    }

    /// Apply the gates to a round, updating `flags`
    pub fn evaluate(&self, round: &RoundResult, flags: &mut RetryFlags) -> Verdict {
        if let Some(reason) = round.untrusted() {
            return retry_once(flags, FaultClass::Collection, reason, None);
        }

        if let Some(reason) = self.rate_inconsistency(round) {
            return retry_once(flags, FaultClass::RateInconsistency, reason, None);
        }

        if let Some(reason) = self.exhaustion(round) {
            return retry_once(
                flags,
                FaultClass::Exhaustion,
                reason,
                Some(self.config.exhaustion_backoff),
            );
        }

        if let Some(reason) = self.refusal(round) {
            if flags.raise(FaultClass::Refusal) {
                return Verdict::TargetUnreachable(reason);
            }
            return Verdict::Retry {
                fault: FaultClass::Refusal,
                reason,
                backoff: None,
            };
        }

        flags.clear();
        Verdict::Advance
    }

    /// Realised connection rate spread against the per-worker target rate
    fn rate_inconsistency(&self, round: &RoundResult) -> Option<StampedeError> {
        let realised: Vec<f64> = round
            .records
            .iter()
            .map(|r| r.metrics.connections_per_second)
            .collect();
        let targets: Vec<f64> = round
            .records
            .iter()
            .map(|r| r.request.connection_rate as f64)
            .collect();

        let stddev = std_dev(&realised)?;
        let threshold = mean(&targets)? * self.config.rate_deviation_ratio;

        (stddev > threshold).then_some(StampedeError::StatisticalInconsistency { stddev, threshold })
    }

    fn exhaustion(&self, round: &RoundResult) -> Option<StampedeError> {
        round
            .diagnostics
            .iter()
            .find(|d| d.stderr.contains(&self.config.exhaustion_signature))
            .map(|d| StampedeError::EnvironmentExhaustion {
                worker_id: d.worker_id.clone(),
                signature: self.config.exhaustion_signature.clone(),
            })
    }

    fn refusal(&self, round: &RoundResult) -> Option<StampedeError> {
        let attempted = round.requested_connections();
        let refused = round.refused_connections();

        (attempted > 0.0 && refused / attempted >= self.config.refusal_ratio)
            .then_some(StampedeError::TargetUnreachable { refused, attempted })
    }

    pub async fn run<S>(&self, coordinator: &mut Coordinator, sink: &mut S) -> Result<RunSummary, ExecutionError>
    where
        S: RecordSink + ?Sized,
    {
        let mut rate = self.config.starting_rate;
        let mut flags = RetryFlags::default();
        let mut rounds = 0;
        let mut untrusted_rounds = 0;
        let mut last_rate = rate;

        info!(rate, step = self.config.step, "Starting validated ramp");

        let end = loop {
            if self.config.max_rate.is_some_and(|max| rate > max) {
                break EndReason::MaxRateReached;
            }

            rounds += 1;
            last_rate = rate;

            let connections =
                self.config.round_duration_secs * rate * coordinator.worker_count() as u64;
            let request = self.target.request(connections, rate);

            let round = coordinator.run_round(&request).await;
            sink.write_round(&round.records)?;
            if !round.trusted {
                untrusted_rounds += 1;
            }

            match self.evaluate(&round, &mut flags) {
                Verdict::Advance => {
                    let benchmark_id = round
                        .records
                        .first()
                        .map(|r| r.benchmark_id)
                        .unwrap_or(round.benchmark_id);
                    info!(%benchmark_id, round = rounds, rate, "Round validated");
                    rate += self.config.step;
                }
                Verdict::Retry {
                    fault,
                    reason,
                    backoff,
                } => {
                    warn!(round = rounds, rate, ?fault, %reason, "Retrying round");
                    if let Some(backoff) = backoff {
                        warn!(?backoff, "Backing off before retry");
                        sleep(backoff).await;
                    }
                }
                Verdict::Abort(reason) => {
                    error!(round = rounds, rate, %reason, "Fault repeated, aborting run");
                    return Err(ExecutionError::Aborted { rate, reason });
                }
                Verdict::TargetUnreachable(reason) => {
                    info!(round = rounds, rate, %reason, "Target stopped accepting connections");
                    break EndReason::TargetUnreachable;
                }
            }

            sleep(self.config.round_delay).await;
        };

        let summary = RunSummary {
            rounds,
            untrusted_rounds,
            final_rate: last_rate,
            end,
        };
        info!(rounds, final_rate = last_rate, end = %end, "Validated ramp finished");
        Ok(summary)
    }
}

fn retry_once(
    flags: &mut RetryFlags,
    fault: FaultClass,
    reason: StampedeError,
    backoff: Option<Duration>,
) -> Verdict {
    if flags.raise(fault) {
        Verdict::Abort(reason)
    } else {
        Verdict::Retry {
            fault,
            reason,
            backoff,
        }
    }
}
