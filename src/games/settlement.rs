//! Outcome resolution
//!
//! Turns a terminal round (win or farkle) into a `SettlementRecord`. The
//! resolver never talks to the ledger or history log; the record is handed
//! out as an event and applied by whoever owns those collaborators.

use crate::config::RulesConfig;
use crate::games::types::{GameOutcome, GameType, RoundState, SettlementRecord};
use uuid::Uuid;

/// Computes payouts and builds settlement records
#[derive(Debug, Clone)]
pub struct OutcomeResolver {
    payout_multiplier: u64,
}

impl OutcomeResolver {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            payout_multiplier: rules.payout_multiplier,
        }
    }

    /// Payout for a stake: multiplier x stake on a win, nothing on a loss
    pub fn payout(&self, stake: u64, outcome: GameOutcome) -> u64 {
        match outcome {
            GameOutcome::Win => stake.saturating_mul(self.payout_multiplier),
            GameOutcome::Loss => 0,
        }
    }

    /// Build the settlement record from the round snapshot
    pub fn resolve(&self, outcome: GameOutcome, state: &RoundState) -> SettlementRecord {
        SettlementRecord {
            settlement_id: Uuid::new_v4().to_string(),
            game_type: GameType::Dice10000,
            stake: state.stake,
            outcome,
            payout: self.payout(state.stake, outcome),
            final_score: state.banked_score,
            roll_count: state.roll_count,
            created_at: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

impl Default for OutcomeResolver {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::Phase;

    fn finished_state(stake: u64, banked: u32) -> RoundState {
        let mut state = RoundState::new(750);
        state.phase = Phase::Finished;
        state.stake = stake;
        state.banked_score = banked;
        state.roll_count = 4;
        state
    }

    #[test]
    fn test_win_pays_double() {
        let resolver = OutcomeResolver::default();
        let record = resolver.resolve(GameOutcome::Win, &finished_state(150, 10_250));
        assert_eq!(record.stake, 150);
        assert_eq!(record.payout, 300);
        assert_eq!(record.final_score, 10_250);
        assert_eq!(record.roll_count, 4);
        assert_eq!(record.game_type, GameType::Dice10000);
    }

    #[test]
    fn test_loss_pays_nothing() {
        let resolver = OutcomeResolver::default();
        let record = resolver.resolve(GameOutcome::Loss, &finished_state(100, 0));
        assert_eq!(record.payout, 0);
        assert_eq!(record.outcome, GameOutcome::Loss);
    }

    #[test]
    fn test_settlement_ids_are_unique() {
        let resolver = OutcomeResolver::default();
        let state = finished_state(100, 0);
        let a = resolver.resolve(GameOutcome::Loss, &state);
        let b = resolver.resolve(GameOutcome::Loss, &state);
        assert_ne!(a.settlement_id, b.settlement_id);
    }

    #[test]
    fn test_custom_multiplier() {
        let rules = RulesConfig {
            payout_multiplier: 3,
            ..Default::default()
        };
        assert_eq!(OutcomeResolver::new(&rules).payout(100, GameOutcome::Win), 300);
    }
}
