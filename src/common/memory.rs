//! In-memory collaborator implementations
//!
//! Used by the CLI and by tests. Failures can be injected so the session's
//! error paths are reachable without a real ledger service.

use crate::common::traits::{HistoryLog, Ledger, NotificationSink};
use crate::errors::{HistoryError, LedgerError};
use crate::games::types::HistoryEntry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;

/// Ledger holding a single balance
#[derive(Debug)]
pub struct InMemoryLedger {
    balance: AsyncMutex<u64>,
    fail_debits: AtomicBool,
    fail_credits: AtomicBool,
}

impl InMemoryLedger {
    pub fn new(balance: u64) -> Self {
        Self {
            balance: AsyncMutex::new(balance),
            fail_debits: AtomicBool::new(false),
            fail_credits: AtomicBool::new(false),
        }
    }

    /// Make every subsequent debit fail with `Unavailable`
    pub fn set_fail_debits(&self, fail: bool) {
        self.fail_debits.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent credit fail with `Unavailable`
    pub fn set_fail_credits(&self, fail: bool) {
        self.fail_credits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance(&self) -> Result<u64, LedgerError> {
        Ok(*self.balance.lock().await)
    }

    async fn debit(&self, amount: u64) -> Result<(), LedgerError> {
        if self.fail_debits.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("debit rejected by test hook".to_string()));
        }

        let mut balance = self.balance.lock().await;
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    async fn credit(&self, amount: u64) -> Result<(), LedgerError> {
        if self.fail_credits.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("credit rejected by test hook".to_string()));
        }

        let mut balance = self.balance.lock().await;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Rejected("balance overflow".to_string()))?;
        Ok(())
    }
}

/// History log that keeps entries in a vector
#[derive(Debug, Default)]
pub struct InMemoryHistoryLog {
    entries: AsyncMutex<Vec<HistoryEntry>>,
    fail: AtomicBool,
}

impl InMemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl HistoryLog for InMemoryHistoryLog {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HistoryError::Unavailable("history rejected by test hook".to_string()));
        }
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

/// Forwards notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, message: &str) {
        tracing::info!(target: "dice10k::notification", "{}", message);
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
