use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of dice in play
pub const DICE_COUNT: usize = 6;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Dice10000,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Dice10000 => write!(f, "dice10000"),
        }
    }
}

/// A single die face. Zero means "not rolled yet this turn".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Die(u8);

impl TryFrom<u8> for Die {
    type Error = String;

    fn try_from(face: u8) -> Result<Self, Self::Error> {
        if face > 6 {
            return Err(format!("die face {} is outside 0..=6", face));
        }
        Ok(Die(face))
    }
}

impl From<Die> for u8 {
    fn from(die: Die) -> u8 {
        die.0
    }
}

impl Die {
    pub const UNROLLED: Die = Die(0);

    /// Create a rolled die. Returns `None` outside 1..=6.
    pub fn new(face: u8) -> Option<Self> {
        (1..=6).contains(&face).then_some(Die(face))
    }

    pub fn face(self) -> u8 {
        self.0
    }

    pub fn is_rolled(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_rolled() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "-")
        }
    }
}

/// Six dice addressed by position 0..5
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DiceLayout([Die; DICE_COUNT]);

impl DiceLayout {
    pub fn new(dice: [Die; DICE_COUNT]) -> Self {
        Self(dice)
    }

    /// Build a layout from raw faces (0 allowed for unrolled slots)
    pub fn from_faces(faces: [u8; DICE_COUNT]) -> Option<Self> {
        let mut dice = [Die::UNROLLED; DICE_COUNT];
        for (slot, face) in dice.iter_mut().zip(faces) {
            *slot = if face == 0 { Die::UNROLLED } else { Die::new(face)? };
        }
        Some(Self(dice))
    }

    pub fn get(&self, position: usize) -> Die {
        self.0[position]
    }

    pub fn set(&mut self, position: usize, die: Die) {
        self.0[position] = die;
    }

    pub fn dice(&self) -> &[Die; DICE_COUNT] {
        &self.0
    }

    pub fn faces(&self) -> [u8; DICE_COUNT] {
        self.0.map(Die::face)
    }

    /// True before the first roll of a turn
    pub fn is_unrolled(&self) -> bool {
        self.0.iter().all(|d| !d.is_rolled())
    }

    /// Dice at the given positions, in position order
    pub fn values_at(&self, positions: PositionSet) -> Vec<Die> {
        positions.iter().map(|p| self.0[p]).collect()
    }
}

impl fmt::Display for DiceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, die) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", die)?;
        }
        Ok(())
    }
}

/// Set of die positions, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct PositionSet(u8);

impl TryFrom<u8> for PositionSet {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits & !Self::ALL.0 != 0 {
            return Err(format!("position mask {:#010b} names a position past {}", bits, DICE_COUNT - 1));
        }
        Ok(PositionSet(bits))
    }
}

impl From<PositionSet> for u8 {
    fn from(set: PositionSet) -> u8 {
        set.0
    }
}

impl PositionSet {
    pub const EMPTY: PositionSet = PositionSet(0);
    pub const ALL: PositionSet = PositionSet((1 << DICE_COUNT) - 1);

    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Self {
        let mut set = Self::EMPTY;
        for p in positions {
            set.insert(p);
        }
        set
    }

    pub fn contains(self, position: usize) -> bool {
        position < DICE_COUNT && self.0 & (1 << position) != 0
    }

    pub fn insert(&mut self, position: usize) {
        if position < DICE_COUNT {
            self.0 |= 1 << position;
        }
    }

    pub fn remove(&mut self, position: usize) {
        if position < DICE_COUNT {
            self.0 &= !(1 << position);
        }
    }

    /// Flip membership; returns whether the position is now a member
    pub fn toggle(&mut self, position: usize) -> bool {
        if self.contains(position) {
            self.remove(position);
            false
        } else {
            self.insert(position);
            true
        }
    }

    pub fn union(self, other: PositionSet) -> PositionSet {
        PositionSet(self.0 | other.0)
    }

    pub fn intersection(self, other: PositionSet) -> PositionSet {
        PositionSet(self.0 & other.0)
    }

    pub fn complement(self) -> PositionSet {
        PositionSet(!self.0 & Self::ALL.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_full(self) -> bool {
        self == Self::ALL
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..DICE_COUNT).filter(move |&p| self.contains(p))
    }
}

/// Round phase
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Betting,
    Rolling,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Betting => write!(f, "betting"),
            Phase::Rolling => write!(f, "rolling"),
            Phase::Finished => write!(f, "finished"),
        }
    }
}

/// Game outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Win => write!(f, "win"),
            GameOutcome::Loss => write!(f, "loss"),
        }
    }
}

/// Payment settlement record produced when a round ends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementRecord {
    pub settlement_id: String,
    pub game_type: GameType,
    pub stake: u64,
    pub outcome: GameOutcome,
    pub payout: u64,
    pub final_score: u32,
    pub roll_count: u32,
    pub created_at: u64,
}

/// Entry handed to the external history log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub game_type: GameType,
    pub bet: u64,
    pub outcome: GameOutcome,
    pub win_amount: u64,
}

impl From<&SettlementRecord> for HistoryEntry {
    fn from(record: &SettlementRecord) -> Self {
        Self {
            game_type: record.game_type,
            bet: record.stake,
            outcome: record.outcome,
            win_amount: record.payout,
        }
    }
}

/// Mutable state of one player's turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundState {
    pub phase: Phase,
    /// Stake reserved for this round; zero while betting
    pub stake: u64,
    /// Points accumulated this turn through successful banks
    pub banked_score: u32,
    pub roll_count: u32,
    pub min_to_board: u32,
    pub dice: DiceLayout,
    pub held: PositionSet,
    pub selected: PositionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    /// Settlement awaiting ledger confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_settlement: Option<SettlementRecord>,
}

impl RoundState {
    /// Fresh betting-phase state
    pub fn new(opening_threshold: u32) -> Self {
        Self {
            phase: Phase::Betting,
            stake: 0,
            banked_score: 0,
            roll_count: 0,
            min_to_board: opening_threshold,
            dice: DiceLayout::default(),
            held: PositionSet::EMPTY,
            selected: PositionSet::EMPTY,
            outcome: None,
            pending_settlement: None,
        }
    }

    /// Positions neither held nor selected
    pub fn unselected_active(&self) -> PositionSet {
        self.held.union(self.selected).complement()
    }

    /// Dice still in play (not held); a pending selection still counts
    pub fn active_dice(&self) -> Vec<Die> {
        self.dice.values_at(self.held.complement())
    }

    pub fn selected_dice(&self) -> Vec<Die> {
        self.dice.values_at(self.selected)
    }

    /// Rolled dice that are neither held nor selected
    pub fn dice_remaining(&self) -> usize {
        self.unselected_active()
            .iter()
            .filter(|&p| self.dice.get(p).is_rolled())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_die_bounds() {
        assert!(Die::new(0).is_none());
        assert!(Die::new(7).is_none());
        assert_eq!(Die::new(6).map(Die::face), Some(6));
        assert!(!Die::UNROLLED.is_rolled());
    }

    #[test]
    fn test_position_set_toggle_is_involution() {
        let mut set = PositionSet::from_positions([0, 3]);
        let before = set;
        assert!(set.toggle(5));
        assert!(!set.toggle(5));
        assert_eq!(set, before);
    }

    #[test]
    fn test_position_set_complement() {
        let set = PositionSet::from_positions([0, 1, 2]);
        assert_eq!(set.complement().iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert!(set.union(set.complement()).is_full());
        assert!(set.intersection(set.complement()).is_empty());
    }

    #[test]
    fn test_out_of_range_positions_are_ignored() {
        let mut set = PositionSet::EMPTY;
        set.insert(6);
        assert!(set.is_empty());
        assert!(!set.contains(9));
    }

    #[test]
    fn test_dice_remaining_excludes_unrolled() {
        let mut state = RoundState::new(1000);
        state.dice = DiceLayout::from_faces([1, 2, 0, 4, 0, 6]).unwrap();
        state.held = PositionSet::from_positions([0]);
        state.selected = PositionSet::from_positions([1]);
        assert_eq!(state.dice_remaining(), 2);
    }

    #[test]
    fn test_round_state_serde() {
        let mut state = RoundState::new(1000);
        state.dice = DiceLayout::from_faces([1, 1, 1, 2, 3, 4]).unwrap();
        state.selected = PositionSet::from_positions([0, 1, 2]);

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"phase\":\"betting\""));
        let restored: RoundState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_out_of_range_faces_fail_to_deserialize() {
        assert_eq!(serde_json::from_str::<Die>("6").unwrap().face(), 6);
        assert!(serde_json::from_str::<Die>("0").is_ok());
        assert!(serde_json::from_str::<Die>("9").is_err());
        assert!(serde_json::from_str::<DiceLayout>("[9,1,1,2,3,4]").is_err());
    }

    #[test]
    fn test_position_mask_past_six_fails_to_deserialize() {
        let set: PositionSet = serde_json::from_str("63").unwrap();
        assert!(set.is_full());
        assert!(serde_json::from_str::<PositionSet>("64").is_err());
        assert!(serde_json::from_str::<PositionSet>("192").is_err());
        assert_eq!(serde_json::to_string(&set).unwrap(), "63");
    }

    #[test]
    fn test_history_entry_is_camel_case() {
        let entry = HistoryEntry {
            game_type: GameType::Dice10000,
            bet: 100,
            outcome: GameOutcome::Win,
            win_amount: 200,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["gameType"], "dice10000");
        assert_eq!(json["winAmount"], 200);
    }
}
