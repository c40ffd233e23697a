//! Score calculation for the 10,000 dice game
//!
//! Scoring table:
//! - six of a kind: 10,000 (instant win), checked first
//! - straight 1-2-3-4-5-6: 1,500
//! - three or more 1s: 1,000 plus 100 per extra 1
//! - three or more 5s: 500 plus 50 per extra 5
//! - three of another face: face x 100, doubled for four, tripled for five,
//!   quadrupled for six
//! - single 1s: 100 each, single 5s: 50 each

use crate::games::types::{Die, DICE_COUNT};

/// Score awarded for six identical dice
pub const SIX_OF_A_KIND_SCORE: u32 = 10_000;

/// Score awarded for a 1-6 straight
pub const STRAIGHT_SCORE: u32 = 1_500;

/// Per-face counts, indexed by face value (index 0 counts unrolled dice)
fn face_counts(dice: &[Die]) -> [usize; 7] {
    let mut counts = [0usize; 7];
    for die in dice {
        counts[die.face() as usize] += 1;
    }
    counts
}

fn is_six_of_a_kind(dice: &[Die]) -> bool {
    dice.len() == DICE_COUNT && dice.iter().all(|d| *d == dice[0])
}

fn is_straight(dice: &[Die], counts: &[usize; 7]) -> bool {
    dice.len() == DICE_COUNT && counts[1..=6].iter().all(|&n| n == 1)
}

/// Six dice showing each face 1-6 exactly once
pub fn is_full_straight(dice: &[Die]) -> bool {
    is_straight(dice, &face_counts(dice))
}

/// Points contributed by `count` dice showing `face`
fn face_score(face: u8, count: usize) -> u32 {
    let n = count as u32;
    match (face, count) {
        (_, 0) => 0,
        (1, c) if c >= 3 => 1_000 + 100 * (n - 3),
        (5, c) if c >= 3 => 500 + 50 * (n - 3),
        (f, c) if c >= 3 => {
            let base = f as u32 * 100;
            match c {
                3 => base,
                4 => base * 2,
                5 => base * 3,
                _ => base * 4,
            }
        }
        (1, _) => 100 * n,
        (5, _) => 50 * n,
        _ => 0,
    }
}

/// Score a selection of dice. Order is irrelevant; an empty selection scores 0.
pub fn score(dice: &[Die]) -> u32 {
    if dice.is_empty() {
        return 0;
    }

    if is_six_of_a_kind(dice) {
        return SIX_OF_A_KIND_SCORE;
    }

    let counts = face_counts(dice);
    if is_straight(dice, &counts) {
        return STRAIGHT_SCORE;
    }

    (1..=6u8)
        .map(|face| face_score(face, counts[face as usize]))
        .sum()
}

/// Whether the active dice contain at least one scoring die or combination.
/// A roll for which this is false is a farkle.
pub fn has_scoring_dice(active: &[Die]) -> bool {
    let counts = face_counts(active);

    if counts[1] > 0 || counts[5] > 0 {
        return true;
    }

    if counts[1..=6].iter().any(|&n| n >= 3) {
        return true;
    }

    is_straight(active, &counts)
}

/// Positions (indices into `dice`) that contribute to the score on their own:
/// every 1 and 5, every die of a face showing three or more times, or all six
/// dice of a straight.
pub fn scoring_indices(dice: &[Die]) -> Vec<usize> {
    let counts = face_counts(dice);
    if is_straight(dice, &counts) {
        return (0..dice.len()).collect();
    }

    dice.iter()
        .enumerate()
        .filter(|(_, die)| {
            let face = die.face();
            face != 0 && (face == 1 || face == 5 || counts[face as usize] >= 3)
        })
        .map(|(i, _)| i)
        .collect()
}
