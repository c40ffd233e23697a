//! Collaborator interfaces
//!
//! The engine never owns the player's balance, the game history or the
//! user-facing messages. It reaches them through these traits.

use crate::errors::{HistoryError, LedgerError};
use crate::games::types::HistoryEntry;
use async_trait::async_trait;

/// External ledger owning the player's balance
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current available balance
    async fn balance(&self) -> Result<u64, LedgerError>;

    /// Reserve a stake. Must either debit the full amount or fail without effect.
    async fn debit(&self, amount: u64) -> Result<(), LedgerError>;

    /// Pay out winnings
    async fn credit(&self, amount: u64) -> Result<(), LedgerError>;
}

/// External audit trail of finished games
#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError>;
}

/// Display-only sink for human-readable messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}
