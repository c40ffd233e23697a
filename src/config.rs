//! Configuration with validation and defaults

use crate::errors::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level game configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub betting: BettingConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Scoring thresholds and payout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Banked score that wins the round
    pub target_score: u32,
    /// Minimum selection score for the first bank of a turn
    pub opening_threshold: u32,
    /// Minimum selection score for every later bank
    pub follow_up_threshold: u32,
    /// Most rolled, unheld, unselected dice allowed when banking
    pub max_dice_remaining_to_bank: usize,
    pub payout_multiplier: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            target_score: 10_000,
            opening_threshold: 1_000,
            follow_up_threshold: 750,
            max_dice_remaining_to_bank: 2,
            payout_multiplier: 2,
        }
    }
}

/// Bet slip limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BettingConfig {
    pub default_bet: u64,
    pub bet_step: u64,
    pub min_bet: u64,
    /// Opening balance for the in-memory ledger
    pub starting_balance: u64,
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self {
            default_bet: 100,
            bet_step: 50,
            min_bet: 50,
            starting_balance: 1_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between a finished round and the next betting phase
    pub reset_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { reset_delay_ms: 3_000 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GameConfig {
    /// Validate configuration for logical consistency
    pub fn validate(&self) -> ConfigResult<()> {
        let rules = &self.rules;
        if rules.target_score == 0 {
            return Err(invalid("rules.target_score", rules.target_score, "must be > 0"));
        }
        if rules.opening_threshold == 0 {
            return Err(invalid("rules.opening_threshold", rules.opening_threshold, "must be > 0"));
        }
        if rules.follow_up_threshold == 0 {
            return Err(invalid("rules.follow_up_threshold", rules.follow_up_threshold, "must be > 0"));
        }
        if rules.max_dice_remaining_to_bank >= crate::games::types::DICE_COUNT {
            return Err(invalid(
                "rules.max_dice_remaining_to_bank",
                rules.max_dice_remaining_to_bank,
                "must be smaller than the number of dice",
            ));
        }

        let betting = &self.betting;
        if betting.min_bet == 0 {
            return Err(invalid("betting.min_bet", betting.min_bet, "must be > 0"));
        }
        if betting.bet_step == 0 {
            return Err(invalid("betting.bet_step", betting.bet_step, "must be > 0"));
        }
        if betting.default_bet < betting.min_bet {
            return Err(ConfigurationError::ValidationFailed(format!(
                "betting.default_bet ({}) is below betting.min_bet ({})",
                betting.default_bet, betting.min_bet
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging.level", "", "must not be empty"));
        }

        Ok(())
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.timing.reset_delay_ms)
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
