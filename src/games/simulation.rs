//! Round simulation
//!
//! Plays many rounds against a seeded die source with a simple greedy
//! strategy and aggregates win rate, house edge and roll counts. Useful for
//! sanity checking payout settings without a ledger.

use crate::config::GameConfig;
use crate::errors::DiceResult;
use crate::games::dice_source::{RandomDieSource, RngDieSource};
use crate::games::round::RoundStateMachine;
use crate::games::scoring::scoring_indices;
use crate::games::types::{GameOutcome, Phase};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub rounds: usize,
    pub seed: u64,
    pub stake: u64,
    /// Rounds still running after this many actions are abandoned
    pub max_actions_per_round: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 1_000,
            seed: 42,
            stake: 100,
            max_actions_per_round: 10_000,
        }
    }
}

/// Aggregated results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationReport {
    pub rounds: usize,
    pub wins: usize,
    pub losses: usize,
    pub abandoned: usize,
    pub total_staked: u64,
    pub total_paid: u64,
    pub win_rate: f64,
    pub house_edge: f64,
    pub average_rolls: f64,
    pub execution_time: Duration,
}

enum RoundResult {
    Settled { outcome: GameOutcome, payout: u64, rolls: u32 },
    Abandoned,
}

/// Runs rounds back to back on one state machine
pub struct Simulator<S: RandomDieSource> {
    machine: RoundStateMachine,
    dice: S,
    config: SimulationConfig,
    game_config: GameConfig,
}

impl Simulator<RngDieSource> {
    pub fn seeded(game_config: &GameConfig, config: SimulationConfig) -> Self {
        let dice = RngDieSource::seeded(config.seed);
        Self::new(game_config, config, dice)
    }
}

impl<S: RandomDieSource> Simulator<S> {
    pub fn new(game_config: &GameConfig, config: SimulationConfig, dice: S) -> Self {
        Self {
            machine: RoundStateMachine::new(game_config),
            dice,
            config,
            game_config: game_config.clone(),
        }
    }

    pub fn run(&mut self) -> DiceResult<SimulationReport> {
        let start = Instant::now();
        let mut report = SimulationReport {
            rounds: self.config.rounds,
            ..Default::default()
        };
        let mut total_rolls = 0u64;

        for round in 0..self.config.rounds {
            report.total_staked += self.config.stake;
            match self.play_round()? {
                RoundResult::Settled { outcome, payout, rolls } => {
                    total_rolls += u64::from(rolls);
                    report.total_paid += payout;
                    match outcome {
                        GameOutcome::Win => report.wins += 1,
                        GameOutcome::Loss => report.losses += 1,
                    }
                }
                RoundResult::Abandoned => {
                    debug!(round, "Round abandoned after action limit");
                    report.abandoned += 1;
                    self.machine = RoundStateMachine::new(&self.game_config);
                }
            }
        }

        let settled = report.wins + report.losses;
        if settled > 0 {
            report.win_rate = report.wins as f64 / settled as f64;
            report.average_rolls = total_rolls as f64 / settled as f64;
        }
        if report.total_staked > 0 {
            report.house_edge =
                (report.total_staked as f64 - report.total_paid as f64) / report.total_staked as f64;
        }
        report.execution_time = start.elapsed();

        info!(
            rounds = report.rounds,
            wins = report.wins,
            losses = report.losses,
            win_rate = report.win_rate,
            house_edge = report.house_edge,
            "Simulation finished"
        );
        Ok(report)
    }

    fn play_round(&mut self) -> DiceResult<RoundResult> {
        self.machine.start_round(self.config.stake, &mut self.dice)?;

        let mut actions = 0;
        while self.machine.phase() == Phase::Rolling {
            if actions >= self.config.max_actions_per_round {
                return Ok(RoundResult::Abandoned);
            }
            actions += 1;
            self.take_turn()?;
        }

        let state = self.machine.state();
        let (outcome, rolls) = (state.outcome, state.roll_count);
        let payout = self
            .machine
            .pending_settlement()
            .map(|s| s.payout)
            .unwrap_or_default();
        self.machine.confirm_settlement()?;
        self.machine.reset()?;

        Ok(match outcome {
            Some(outcome) => RoundResult::Settled { outcome, payout, rolls },
            None => RoundResult::Abandoned,
        })
    }

    /// Select every scoring die, bank when allowed, otherwise roll on
    fn take_turn(&mut self) -> DiceResult<()> {
        let state = self.machine.state();
        let active: Vec<usize> = state
            .unselected_active()
            .iter()
            .filter(|&p| state.dice.get(p).is_rolled())
            .collect();
        let values: Vec<_> = active.iter().map(|&p| state.dice.get(p)).collect();

        let mut picks: Vec<usize> = scoring_indices(&values)
            .into_iter()
            .map(|i| active[i])
            .collect();
        if picks.is_empty() {
            // keep the turn moving; the reroll decides whether it farkles
            picks.extend(active.first().copied());
        }
        for position in picks {
            self.machine.toggle_selection(position)?;
        }

        if self.machine.snapshot().can_bank {
            self.machine.bank_score(&mut self.dice)?;
        } else {
            self.machine.roll_again(&mut self.dice)?;
        }
        Ok(())
    }
}

/// Convenience wrapper: seeded simulation with default rules
pub fn simulate(game_config: &GameConfig, config: SimulationConfig) -> DiceResult<SimulationReport> {
    Simulator::seeded(game_config, config).run()
}
