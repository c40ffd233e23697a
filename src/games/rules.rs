//! Bank eligibility

use crate::config::RulesConfig;
use crate::games::scoring::score;
use crate::games::types::RoundState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a selection cannot be banked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BankBlocker {
    NothingSelected,
    TooManyDiceRemaining { remaining: usize, allowed: usize },
    /// Nothing banked yet this turn and the selection is below the opening threshold
    BelowBoardThreshold { score: u32, required: u32 },
    BelowBankThreshold { score: u32, required: u32 },
}

impl fmt::Display for BankBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankBlocker::NothingSelected => write!(f, "no dice selected"),
            BankBlocker::TooManyDiceRemaining { remaining, allowed } => write!(
                f,
                "{} dice remaining, you need {} or fewer dice remaining to bank",
                remaining, allowed
            ),
            BankBlocker::BelowBoardThreshold { score, required } => {
                write!(f, "{} points, you need {} points to get on the board", score, required)
            }
            BankBlocker::BelowBankThreshold { score, required } => {
                write!(f, "{} points, you need at least {} points to bank", score, required)
            }
        }
    }
}

/// Check whether the current selection may be banked.
///
/// Returns the selection's score when eligible.
pub fn check_bank(state: &RoundState, rules: &RulesConfig) -> Result<u32, BankBlocker> {
    if state.selected.is_empty() {
        return Err(BankBlocker::NothingSelected);
    }

    let remaining = state.dice_remaining();
    if remaining > rules.max_dice_remaining_to_bank {
        return Err(BankBlocker::TooManyDiceRemaining {
            remaining,
            allowed: rules.max_dice_remaining_to_bank,
        });
    }

    let selection_score = score(&state.selected_dice());
    if state.banked_score == 0 {
        if selection_score < state.min_to_board {
            return Err(BankBlocker::BelowBoardThreshold {
                score: selection_score,
                required: state.min_to_board,
            });
        }
    } else if selection_score < rules.follow_up_threshold {
        return Err(BankBlocker::BelowBankThreshold {
            score: selection_score,
            required: rules.follow_up_threshold,
        });
    }

    Ok(selection_score)
}

pub fn can_bank(state: &RoundState, rules: &RulesConfig) -> bool {
    check_bank(state, rules).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{DiceLayout, Phase, PositionSet};

    fn rolling_state(faces: [u8; 6], selected: &[usize]) -> RoundState {
        let mut state = RoundState::new(1000);
        state.phase = Phase::Rolling;
        state.stake = 100;
        state.dice = DiceLayout::from_faces(faces).unwrap();
        state.selected = PositionSet::from_positions(selected.iter().copied());
        state
    }

    #[test]
    fn test_empty_selection_blocked() {
        let state = rolling_state([1, 1, 1, 1, 1, 2], &[]);
        assert_eq!(
            check_bank(&state, &RulesConfig::default()),
            Err(BankBlocker::NothingSelected)
        );
    }

    #[test]
    fn test_three_remaining_blocks_regardless_of_score() {
        let state = rolling_state([1, 1, 1, 2, 3, 4], &[0, 1, 2]);
        assert_eq!(
            check_bank(&state, &RulesConfig::default()),
            Err(BankBlocker::TooManyDiceRemaining { remaining: 3, allowed: 2 })
        );
    }

    #[test]
    fn test_remaining_limit_follows_rules() {
        let rules = RulesConfig {
            max_dice_remaining_to_bank: 3,
            ..Default::default()
        };
        let state = rolling_state([1, 1, 1, 2, 3, 4], &[0, 1, 2]);
        assert_eq!(check_bank(&state, &rules), Ok(1000));

        let state = rolling_state([1, 1, 1, 1, 2, 3], &[0]);
        let blocker = check_bank(&state, &rules).unwrap_err();
        assert_eq!(blocker, BankBlocker::TooManyDiceRemaining { remaining: 5, allowed: 3 });
        assert!(blocker.to_string().contains("3 or fewer"));
    }

    #[test]
    fn test_opening_threshold() {
        let state = rolling_state([1, 1, 1, 1, 2, 3], &[0, 1, 2, 3]);
        assert_eq!(check_bank(&state, &RulesConfig::default()), Ok(1100));

        let state = rolling_state([5, 5, 5, 5, 2, 3], &[0, 1, 2, 3]);
        assert_eq!(
            check_bank(&state, &RulesConfig::default()),
            Err(BankBlocker::BelowBoardThreshold { score: 550, required: 1000 })
        );
    }

    #[test]
    fn test_follow_up_threshold_after_first_bank() {
        let mut state = rolling_state([4, 4, 4, 4, 2, 3], &[0, 1, 2, 3]);
        state.banked_score = 1000;
        state.min_to_board = 750;
        assert_eq!(check_bank(&state, &RulesConfig::default()), Ok(800));

        let mut state = rolling_state([2, 2, 2, 2, 3, 3], &[0, 1, 2, 3]);
        state.banked_score = 1000;
        state.min_to_board = 750;
        assert_eq!(
            check_bank(&state, &RulesConfig::default()),
            Err(BankBlocker::BelowBankThreshold { score: 400, required: 750 })
        );
    }

    #[test]
    fn test_held_dice_do_not_count_as_remaining() {
        let mut state = rolling_state([1, 1, 1, 6, 2, 3], &[0, 1, 2]);
        state.held = PositionSet::from_positions([3, 4]);
        assert_eq!(state.dice_remaining(), 1);
        assert!(can_bank(&state, &RulesConfig::default()));
    }
}
