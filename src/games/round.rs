//! Round state machine
//!
//! One player's turn: `Betting -> Rolling -> Finished -> Betting`.
//!
//! The machine owns a single serializable [`RoundState`] and is purely
//! synchronous. It never touches the ledger, history log or a clock:
//! terminal transitions produce a [`SettlementRecord`] inside a
//! [`GameEvent::RoundFinished`], and the Finished -> Betting reset is only
//! announced ([`GameEvent::ResetScheduled`]) and then performed when the
//! caller invokes [`RoundStateMachine::reset`].

use crate::config::{GameConfig, RulesConfig};
use crate::errors::{DiceResult, GameError};
use crate::games::dice_source::RandomDieSource;
use crate::games::rules::{check_bank, BankBlocker};
use crate::games::scoring::{has_scoring_dice, is_full_straight, score, SIX_OF_A_KIND_SCORE};
use crate::games::settlement::OutcomeResolver;
use crate::games::types::{
    DiceLayout, GameOutcome, Phase, PositionSet, RoundState, SettlementRecord, DICE_COUNT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Something observable that happened during an action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted { stake: u64, dice: DiceLayout },
    SelectionToggled { position: usize, selected: bool },
    Rolled { dice: DiceLayout, roll_count: u32, hot_dice: bool },
    Banked { points: u32, banked_score: u32, min_to_board: u32 },
    /// Fresh six dice after a bank that did not end the round
    DiceRefreshed { dice: DiceLayout },
    Farkle { lost_score: u32 },
    Won { banked_score: u32 },
    RoundFinished { settlement: SettlementRecord },
    ResetScheduled { delay_ms: u64 },
    RoundReset,
}

/// Round state plus values derived from it for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSnapshot {
    pub state: RoundState,
    /// Score of the current selection
    pub selection_score: u32,
    /// Rolled dice that are neither held nor selected
    pub dice_remaining: usize,
    pub can_bank: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_blocker: Option<BankBlocker>,
    /// Whether the active dice still contain something that scores
    pub has_scoring_dice: bool,
    /// All six dice selected and worth an instant win
    pub auto_win_selected: bool,
    /// All six dice selected and forming a 1-6 straight
    pub straight_selected: bool,
}

/// Result of an accepted action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionReport {
    pub snapshot: RoundSnapshot,
    pub events: Vec<GameEvent>,
}

impl ActionReport {
    /// Settlement produced by this action, if it ended the round
    pub fn settlement(&self) -> Option<&SettlementRecord> {
        self.events.iter().find_map(|e| match e {
            GameEvent::RoundFinished { settlement } => Some(settlement),
            _ => None,
        })
    }
}

/// Drives one player's turn
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    state: RoundState,
    rules: RulesConfig,
    resolver: OutcomeResolver,
    reset_delay: Duration,
}

impl RoundStateMachine {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_rules(config.rules.clone(), config.reset_delay())
    }

    pub fn with_rules(rules: RulesConfig, reset_delay: Duration) -> Self {
        Self {
            state: RoundState::new(rules.opening_threshold),
            resolver: OutcomeResolver::new(&rules),
            rules,
            reset_delay,
        }
    }

    /// Resume from a previously captured state.
    ///
    /// Held and selected positions must not overlap, and neither may point at
    /// an unrolled die once the turn has rolled.
    pub fn restore(config: &GameConfig, state: RoundState) -> DiceResult<Self> {
        let overlap = state.held.intersection(state.selected);
        if !overlap.is_empty() {
            return Err(GameError::InvalidState(format!(
                "positions {:?} are both held and selected",
                overlap.iter().collect::<Vec<_>>()
            )));
        }
        if !state.dice.is_unrolled() {
            let marked = state.held.union(state.selected);
            if let Some(p) = marked.iter().find(|&p| !state.dice.get(p).is_rolled()) {
                return Err(GameError::InvalidState(format!(
                    "position {} is marked but has no face",
                    p
                )));
            }
        }

        let mut machine = Self::new(config);
        machine.state = state;
        Ok(machine)
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn into_state(self) -> RoundState {
        self.state
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let state = &self.state;
        let selected = state.selected_dice();
        let selection_score = score(&selected);
        let bank = if state.phase == Phase::Rolling {
            check_bank(state, &self.rules).err()
        } else {
            Some(BankBlocker::NothingSelected)
        };

        RoundSnapshot {
            state: state.clone(),
            selection_score,
            dice_remaining: state.dice_remaining(),
            can_bank: bank.is_none(),
            bank_blocker: bank,
            has_scoring_dice: state.phase == Phase::Rolling
                && has_scoring_dice(&state.active_dice()),
            auto_win_selected: selected.len() == DICE_COUNT && selection_score == SIX_OF_A_KIND_SCORE,
            straight_selected: is_full_straight(&selected),
        }
    }

    fn report(&self, events: Vec<GameEvent>) -> ActionReport {
        ActionReport {
            snapshot: self.snapshot(),
            events,
        }
    }

    fn require_phase(&self, action: &'static str, phase: Phase) -> DiceResult<()> {
        if self.state.phase != phase {
            return Err(GameError::wrong_phase(action, self.state.phase));
        }
        Ok(())
    }

    /// Begin a round with a stake the ledger has already reserved.
    ///
    /// Resets every round field and rolls six fresh dice.
    pub fn start_round<S: RandomDieSource + ?Sized>(
        &mut self,
        stake: u64,
        source: &mut S,
    ) -> DiceResult<ActionReport> {
        self.require_phase("place_bet", Phase::Betting)?;
        if stake == 0 {
            return Err(GameError::InvalidBet(stake));
        }

        let mut state = RoundState::new(self.rules.opening_threshold);
        state.phase = Phase::Rolling;
        state.stake = stake;
        state.dice = source.roll_layout();
        self.state = state;

        info!(stake, dice = %self.state.dice, "Round started");
        Ok(self.report(vec![GameEvent::RoundStarted {
            stake,
            dice: self.state.dice,
        }]))
    }

    /// Flip a die in or out of the current selection
    pub fn toggle_selection(&mut self, position: usize) -> DiceResult<ActionReport> {
        self.require_phase("toggle_selection", Phase::Rolling)?;
        if position >= DICE_COUNT {
            return Err(GameError::InvalidPosition(position));
        }
        if self.state.held.contains(position) {
            return Err(GameError::HeldDie(position));
        }

        let selected = self.state.selected.toggle(position);
        debug!(position, selected, "Selection toggled");
        Ok(self.report(vec![GameEvent::SelectionToggled { position, selected }]))
    }

    /// Hold the selected dice and roll again.
    ///
    /// Every position that was not held before this call gets a fresh face,
    /// including the ones just moved into the held set. When all six end up
    /// held (or nothing was rolled yet) the whole layout is rolled fresh and
    /// the held set is cleared. A reroll with no scoring dice among the
    /// unheld positions is a farkle and ends the round.
    pub fn roll_again<S: RandomDieSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> DiceResult<ActionReport> {
        self.require_phase("roll_again", Phase::Rolling)?;
        if self.state.selected.is_empty() {
            return Err(GameError::EmptySelectionReroll);
        }

        let previously_held = self.state.held;
        let first_roll = self.state.roll_count == 0 && self.state.dice.is_unrolled();
        self.state.held = previously_held.union(self.state.selected);

        let hot_dice = self.state.held.is_full() || first_roll;
        if hot_dice {
            self.state.dice = source.roll_layout();
            self.state.held = PositionSet::EMPTY;
        } else {
            for position in previously_held.complement().iter() {
                self.state.dice.set(position, source.roll_die());
            }
        }

        self.state.selected = PositionSet::EMPTY;
        self.state.roll_count += 1;

        debug!(
            dice = %self.state.dice,
            roll_count = self.state.roll_count,
            hot_dice,
            "Dice rolled"
        );

        let mut events = vec![GameEvent::Rolled {
            dice: self.state.dice,
            roll_count: self.state.roll_count,
            hot_dice,
        }];

        if !has_scoring_dice(&self.state.active_dice()) {
            let lost_score = self.state.banked_score;
            self.state.banked_score = 0;
            info!(lost_score, roll_count = self.state.roll_count, "Farkle");
            events.push(GameEvent::Farkle { lost_score });
            events.push(self.finish(GameOutcome::Loss));
        }

        Ok(self.report(events))
    }

    /// Bank the current selection.
    ///
    /// Reaching the target score wins the round; otherwise six fresh dice are
    /// rolled and play continues.
    pub fn bank_score<S: RandomDieSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> DiceResult<ActionReport> {
        self.require_phase("bank_score", Phase::Rolling)?;
        let points = check_bank(&self.state, &self.rules).map_err(GameError::InvalidSelectionForBank)?;

        let first_bank = self.state.banked_score == 0;
        self.state.banked_score += points;
        if first_bank {
            self.state.min_to_board = self.rules.follow_up_threshold;
        }
        self.state.selected = PositionSet::EMPTY;

        info!(
            points,
            banked_score = self.state.banked_score,
            min_to_board = self.state.min_to_board,
            "Score banked"
        );

        let mut events = vec![GameEvent::Banked {
            points,
            banked_score: self.state.banked_score,
            min_to_board: self.state.min_to_board,
        }];

        if self.state.banked_score >= self.rules.target_score {
            events.push(GameEvent::Won {
                banked_score: self.state.banked_score,
            });
            events.push(self.finish(GameOutcome::Win));
        } else {
            self.state.dice = source.roll_layout();
            self.state.held = PositionSet::EMPTY;
            events.push(GameEvent::DiceRefreshed {
                dice: self.state.dice,
            });
        }

        Ok(self.report(events))
    }

    fn finish(&mut self, outcome: GameOutcome) -> GameEvent {
        self.state.phase = Phase::Finished;
        self.state.outcome = Some(outcome);
        self.state.selected = PositionSet::EMPTY;

        let settlement = self.resolver.resolve(outcome, &self.state);
        info!(
            settlement_id = %settlement.settlement_id,
            %outcome,
            stake = settlement.stake,
            payout = settlement.payout,
            "Round finished"
        );
        self.state.pending_settlement = Some(settlement.clone());
        GameEvent::RoundFinished { settlement }
    }

    /// Settlement awaiting confirmation, if any
    pub fn pending_settlement(&self) -> Option<&SettlementRecord> {
        self.state.pending_settlement.as_ref()
    }

    /// Mark the pending settlement as applied and schedule the reset
    pub fn confirm_settlement(&mut self) -> DiceResult<ActionReport> {
        self.require_phase("confirm_settlement", Phase::Finished)?;
        let settlement = self
            .state
            .pending_settlement
            .take()
            .ok_or(GameError::wrong_phase("confirm_settlement", Phase::Finished))?;

        let delay_ms = self.reset_delay.as_millis() as u64;
        debug!(settlement_id = %settlement.settlement_id, delay_ms, "Settlement confirmed");
        Ok(self.report(vec![GameEvent::ResetScheduled { delay_ms }]))
    }

    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }

    /// Return to betting with every round field at its default
    pub fn reset(&mut self) -> DiceResult<ActionReport> {
        self.require_phase("reset", Phase::Finished)?;
        if self.state.pending_settlement.is_some() {
            return Err(GameError::SettlementPending);
        }

        self.state = RoundState::new(self.rules.opening_threshold);
        info!("Round reset, ready for a new bet");
        Ok(self.report(vec![GameEvent::RoundReset]))
    }
}
