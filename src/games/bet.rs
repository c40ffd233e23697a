use crate::config::BettingConfig;
use serde::{Deserialize, Serialize};

/// Bet amount the player is preparing before a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetSlip {
    amount: u64,
    step: u64,
    min: u64,
}

impl BetSlip {
    pub fn new(config: &BettingConfig) -> Self {
        Self {
            amount: config.default_bet.max(config.min_bet),
            step: config.bet_step,
            min: config.min_bet,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    /// Lower the bet by one step unless that would go below the minimum.
    /// Returns whether the amount changed.
    pub fn decrease(&mut self) -> bool {
        if self.amount > self.min {
            self.amount = self.amount.saturating_sub(self.step).max(self.min);
            return true;
        }
        false
    }

    /// Raise the bet by one step while it is below the available balance.
    /// Returns whether the amount changed.
    pub fn increase(&mut self, balance: u64) -> bool {
        if self.amount < balance {
            self.amount = self.amount.saturating_add(self.step);
            return true;
        }
        false
    }

    /// Set an explicit amount, clamped to the minimum
    pub fn set(&mut self, amount: u64) {
        self.amount = amount.max(self.min);
    }

    pub fn affordable(&self, balance: u64) -> bool {
        self.amount <= balance
    }
}

impl Default for BetSlip {
    fn default() -> Self {
        Self::new(&BettingConfig::default())
    }
}
