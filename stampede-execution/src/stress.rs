//! Ramping stress test with an error/cooldown state machine

use tokio::time::sleep;
use tracing::{info, warn};

use stampede_config::{StressConfig, TargetConfig};

use crate::controller::{EndReason, RecordSink, RunSummary};
use crate::coordinator::Coordinator;
use crate::error::ExecutionError;
use crate::schedule::{ErrorPredicate, RateSchedule};

/// How one round's verdict moved the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ramping,
    EnteredErrorState,
    /// Still erroring; carries the remaining cooldown
    CooledDown(i64),
    Recovered,
}

/// Mutable ramp state, updated once per round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressState {
    pub rate: u64,
    pub step: u64,
    pub in_error: bool,
    pub cooldown: i64,
    initial_cooldown: i64,
}

impl StressState {
    pub fn new(rate: u64, step: u64, cooldown: u32) -> Self {
        Self {
            rate,
            step,
            in_error: false,
            cooldown: i64::from(cooldown),
            initial_cooldown: i64::from(cooldown),
        }
    }

    /// Fold one round's error verdict into the state.
    ///
    /// The round that first sees errors only enters the error state; every
    /// further erroring round spends one unit of cooldown. A clean round
    /// leaves the error state and restores the full cooldown.
    pub fn observe(&mut self, stressed: bool) -> Transition {
        match (self.in_error, stressed) {
            (false, true) => {
                self.in_error = true;
                Transition::EnteredErrorState
            }
            (true, true) => {
                self.cooldown -= 1;
                Transition::CooledDown(self.cooldown)
            }
            (true, false) => {
                self.in_error = false;
                self.cooldown = self.initial_cooldown;
                Transition::Recovered
            }
            (false, false) => Transition::Ramping,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cooldown < 0
    }

    /// Move to the next rate, picking up the step for the rate just run
    pub fn advance(&mut self, schedule: &RateSchedule) {
        self.step = schedule.step_at(self.rate).unwrap_or(self.step);
        self.rate += self.step;
    }
}

/// Raises the connection rate round after round until the server has been
/// erroring for the whole cooldown.
pub struct StressController {
    config: StressConfig,
    target: TargetConfig,
    schedule: RateSchedule,
    predicate: ErrorPredicate,
}

impl StressController {
    pub fn new(config: StressConfig, target: TargetConfig) -> Self {
        Self {
            schedule: RateSchedule::from_config(&config),
            predicate: ErrorPredicate::from_threshold(config.error_threshold),
            config,
            target,
        }
    }

    pub fn initial_state(&self) -> StressState {
        let step = self
            .schedule
            .step_at(self.config.starting_rate)
            .unwrap_or(self.config.initial_step);
        StressState::new(self.config.starting_rate, step, self.config.cooldown)
    }

    pub async fn run<S>(&self, coordinator: &mut Coordinator, sink: &mut S) -> Result<RunSummary, ExecutionError>
    where
        S: RecordSink + ?Sized,
    {
        let mut state = self.initial_state();
        let mut rounds = 0;
        let mut untrusted_rounds = 0;
        let mut last_rate = state.rate;

        info!(
            rate = state.rate,
            step = state.step,
            cooldown = state.cooldown,
            predicate = ?self.predicate,
            "Starting stress test"
        );

        let end = loop {
            if self.config.max_rate.is_some_and(|max| state.rate > max) {
                break EndReason::MaxRateReached;
            }

            rounds += 1;
            last_rate = state.rate;

            // Every worker sustains the full rate for the round duration
            let connections =
                self.config.round_duration_secs * state.rate * coordinator.worker_count() as u64;
            let request = self.target.request(connections, state.rate);

            let round = coordinator.run_round(&request).await;
            sink.write_round(&round.records)?;
            if !round.trusted {
                untrusted_rounds += 1;
            }

            let stressed = self.predicate.is_stressed(&round.records);
            match state.observe(stressed) {
                Transition::EnteredErrorState => warn!(
                    round = rounds,
                    rate = state.rate,
                    errors = round.total_errors(),
                    cooldown = state.cooldown,
                    "Entering error state"
                ),
                Transition::CooledDown(cooldown) => warn!(
                    round = rounds,
                    rate = state.rate,
                    errors = round.total_errors(),
                    cooldown,
                    "Still in error state"
                ),
                Transition::Recovered => info!(
                    round = rounds,
                    rate = state.rate,
                    "Errors cleared, resuming ramp"
                ),
                Transition::Ramping => info!(round = rounds, rate = state.rate, "Round complete"),
            }

            if state.is_exhausted() {
                break EndReason::CooldownExhausted;
            }

            state.advance(&self.schedule);
            sleep(self.config.round_delay).await;
        };

        let summary = RunSummary {
            rounds,
            untrusted_rounds,
            final_rate: last_rate,
            end,
        };
        info!(rounds, final_rate = last_rate, end = %end, "Stress test finished");
        Ok(summary)
    }
}
