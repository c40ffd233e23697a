//! Error types for the dice engine
//!
//! Every rejection is local and non-fatal: the engine never panics on bad
//! input, it hands back a `GameError` and leaves its state untouched.

use crate::games::rules::BankBlocker;
use crate::games::types::Phase;

/// Root error type for all game actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Ledger debit failed: {0}")]
    LedgerDebitFailed(String),

    #[error("Ledger credit failed: {0}")]
    LedgerCreditFailed(String),

    #[error("Action {action} is not allowed during {phase}")]
    InvalidActionForPhase { action: &'static str, phase: Phase },

    #[error("Select at least one die before rolling again")]
    EmptySelectionReroll,

    #[error("Selection cannot be banked: {0}")]
    InvalidSelectionForBank(BankBlocker),

    #[error("Invalid die position: {0}")]
    InvalidPosition(usize),

    #[error("Die at position {0} is held for the rest of the turn")]
    HeldDie(usize),

    #[error("Invalid bet amount: {0}")]
    InvalidBet(u64),

    #[error("Settlement has not been credited yet")]
    SettlementPending,

    #[error("Invalid round state: {0}")]
    InvalidState(String),
}

/// Failures reported by the external ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger rejected operation: {0}")]
    Rejected(String),
}

/// Failures reported by the history log
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("History log unavailable: {0}")]
    Unavailable(String),
}

/// Configuration and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue { field: String, value: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

impl GameError {
    pub(crate) fn wrong_phase(action: &'static str, phase: Phase) -> Self {
        GameError::InvalidActionForPhase { action, phase }
    }

    /// Map a ledger failure during a debit
    pub fn from_debit(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { requested, available } => {
                GameError::InsufficientBalance { requested, available }
            }
            other => GameError::LedgerDebitFailed(other.to_string()),
        }
    }

    /// Map a ledger failure during a credit
    pub fn from_credit(err: LedgerError) -> Self {
        GameError::LedgerCreditFailed(err.to_string())
    }
}

/// Convenience type alias for game results
pub type DiceResult<T> = Result<T, GameError>;

/// Convenience type alias for configuration results
pub type ConfigResult<T> = Result<T, ConfigurationError>;
