//! Game session
//!
//! Owns a [`RoundStateMachine`] together with the die source and the external
//! collaborators. The session is where ledger calls are awaited: the stake is
//! debited before the machine leaves Betting, and a win is credited before
//! the settlement is confirmed and the reset is scheduled.
//!
//! The reset is never slept on here. After a confirmed settlement the session
//! holds a deadline; callers wait however they like and then call
//! [`GameSession::tick`].

use crate::common::traits::{HistoryLog, Ledger, NotificationSink};
use crate::config::GameConfig;
use crate::errors::{DiceResult, GameError};
use crate::games::bet::BetSlip;
use crate::games::dice_source::RandomDieSource;
use crate::games::round::{ActionReport, GameEvent, RoundSnapshot, RoundStateMachine};
use crate::games::types::{GameOutcome, HistoryEntry, Phase, SettlementRecord};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const MSG_INSUFFICIENT_BALANCE: &str = "Not enough credits to place this bet!";
pub const MSG_DEBIT_FAILED: &str = "Failed to place bet. Please try again.";
pub const MSG_CREDIT_FAILED: &str = "Failed to pay out winnings. Please try again.";
pub const MSG_EMPTY_SELECTION: &str = "Select at least one scoring die before rolling again.";
pub const MSG_FARKLE: &str = "Farkle! No scoring dice, you lose all unbanked points!";

/// One player's seat at the table
pub struct GameSession<S: RandomDieSource> {
    machine: RoundStateMachine,
    dice: S,
    ledger: Arc<dyn Ledger>,
    history: Arc<dyn HistoryLog>,
    notifications: Arc<dyn NotificationSink>,
    bet_slip: BetSlip,
    reset_deadline: Option<Instant>,
}

impl<S: RandomDieSource> GameSession<S> {
    pub fn new(
        config: &GameConfig,
        dice: S,
        ledger: Arc<dyn Ledger>,
        history: Arc<dyn HistoryLog>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            machine: RoundStateMachine::new(config),
            dice,
            ledger,
            history,
            notifications,
            bet_slip: BetSlip::new(&config.betting),
            reset_deadline: None,
        }
    }

    pub fn machine(&self) -> &RoundStateMachine {
        &self.machine
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.machine.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn bet_slip(&self) -> &BetSlip {
        &self.bet_slip
    }

    /// When the Finished -> Betting reset becomes due
    pub fn reset_deadline(&self) -> Option<Instant> {
        self.reset_deadline
    }

    fn require_betting(&self, action: &'static str) -> DiceResult<()> {
        match self.machine.phase() {
            Phase::Betting => Ok(()),
            phase => Err(GameError::InvalidActionForPhase { action, phase }),
        }
    }

    /// Raise the bet slip by one step, bounded by the ledger balance
    pub async fn increase_bet(&mut self) -> DiceResult<u64> {
        self.require_betting("increase_bet")?;
        let balance = self.ledger.balance().await.map_err(GameError::from_debit)?;
        self.bet_slip.increase(balance);
        Ok(self.bet_slip.amount())
    }

    /// Lower the bet slip by one step, bounded by the minimum bet
    pub fn decrease_bet(&mut self) -> DiceResult<u64> {
        self.require_betting("decrease_bet")?;
        self.bet_slip.decrease();
        Ok(self.bet_slip.amount())
    }

    /// Place the amount currently on the bet slip
    pub async fn place_current_bet(&mut self) -> DiceResult<ActionReport> {
        let amount = self.bet_slip.amount();
        self.place_bet(amount).await
    }

    /// Debit the stake and start a round.
    ///
    /// On any ledger failure the machine stays in Betting.
    pub async fn place_bet(&mut self, amount: u64) -> DiceResult<ActionReport> {
        self.require_betting("place_bet")?;
        if amount == 0 || amount < self.bet_slip.min() {
            return Err(GameError::InvalidBet(amount));
        }

        if let Err(e) = self.ledger.debit(amount).await {
            let err = GameError::from_debit(e);
            warn!(amount, error = %err, "Bet rejected");
            self.notifications.notify(match &err {
                GameError::InsufficientBalance { .. } => MSG_INSUFFICIENT_BALANCE,
                _ => MSG_DEBIT_FAILED,
            });
            return Err(err);
        }

        self.bet_slip.set(amount);
        self.machine.start_round(amount, &mut self.dice)
    }

    pub fn toggle_selection(&mut self, position: usize) -> DiceResult<ActionReport> {
        self.machine.toggle_selection(position)
    }

    pub async fn roll_again(&mut self) -> DiceResult<ActionReport> {
        let report = match self.machine.roll_again(&mut self.dice) {
            Ok(report) => report,
            Err(GameError::EmptySelectionReroll) => {
                self.notifications.notify(MSG_EMPTY_SELECTION);
                return Err(GameError::EmptySelectionReroll);
            }
            Err(e) => return Err(e),
        };
        self.after_action(report).await
    }

    pub async fn bank_score(&mut self) -> DiceResult<ActionReport> {
        let report = self.machine.bank_score(&mut self.dice)?;
        self.after_action(report).await
    }

    /// Settle the round if the action ended it
    async fn after_action(&mut self, mut report: ActionReport) -> DiceResult<ActionReport> {
        let Some(settlement) = report.settlement().cloned() else {
            return Ok(report);
        };

        if settlement.outcome == GameOutcome::Loss {
            self.notifications.notify(MSG_FARKLE);
        }
        self.record_history(&settlement).await;

        let confirmed = self.apply_settlement(&settlement).await?;
        report.events.extend(confirmed.events);
        report.snapshot = confirmed.snapshot;
        Ok(report)
    }

    async fn record_history(&self, settlement: &SettlementRecord) {
        let entry = HistoryEntry::from(settlement);
        if let Err(e) = self.history.record(&entry).await {
            warn!(settlement_id = %settlement.settlement_id, error = %e, "Failed to record game history");
        }
    }

    async fn apply_settlement(&mut self, settlement: &SettlementRecord) -> DiceResult<ActionReport> {
        if settlement.payout > 0 {
            if let Err(e) = self.ledger.credit(settlement.payout).await {
                let err = GameError::from_credit(e);
                warn!(
                    settlement_id = %settlement.settlement_id,
                    payout = settlement.payout,
                    error = %err,
                    "Payout credit failed, settlement left pending"
                );
                self.notifications.notify(MSG_CREDIT_FAILED);
                return Err(err);
            }
            info!(payout = settlement.payout, "Payout credited");
        }
        if settlement.outcome == GameOutcome::Win {
            self.notifications.notify(&format!(
                "Congratulations! You've reached {} points and won {} credits!",
                settlement.final_score, settlement.payout
            ));
        }

        let report = self.machine.confirm_settlement()?;
        let deadline = Instant::now() + self.machine.reset_delay();
        self.reset_deadline = Some(deadline);
        debug!(delay_ms = self.machine.reset_delay().as_millis() as u64, "Reset scheduled");
        Ok(report)
    }

    /// Retry crediting a settlement whose payout failed earlier
    pub async fn retry_settlement(&mut self) -> DiceResult<ActionReport> {
        let settlement = self
            .machine
            .pending_settlement()
            .cloned()
            .ok_or(GameError::InvalidActionForPhase {
                action: "retry_settlement",
                phase: self.machine.phase(),
            })?;
        self.apply_settlement(&settlement).await
    }

    /// Perform the scheduled reset if it is due at `now`
    pub fn tick(&mut self, now: Instant) -> DiceResult<Option<ActionReport>> {
        match self.reset_deadline {
            Some(deadline) if now >= deadline => {
                self.reset_deadline = None;
                self.machine.reset().map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// True when the events contain a scheduled reset
pub fn reset_scheduled(events: &[GameEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, GameEvent::ResetScheduled { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory::{InMemoryHistoryLog, InMemoryLedger, RecordingNotificationSink};
    use crate::games::dice_source::ScriptedDieSource;
    use std::time::Duration;

    struct Harness {
        session: GameSession<ScriptedDieSource>,
        ledger: Arc<InMemoryLedger>,
        history: Arc<InMemoryHistoryLog>,
        sink: Arc<RecordingNotificationSink>,
    }

    fn harness(balance: u64, faces: Vec<u8>) -> Harness {
        let ledger = Arc::new(InMemoryLedger::new(balance));
        let history = Arc::new(InMemoryHistoryLog::new());
        let sink = Arc::new(RecordingNotificationSink::new());
        let session = GameSession::new(
            &GameConfig::default(),
            ScriptedDieSource::new(faces),
            ledger.clone(),
            history.clone(),
            sink.clone(),
        );
        Harness {
            session,
            ledger,
            history,
            sink,
        }
    }

    async fn win_with_six_fours(h: &mut Harness) -> DiceResult<ActionReport> {
        h.session.place_bet(100).await?;
        for p in 0..6 {
            h.session.toggle_selection(p)?;
        }
        h.session.bank_score().await
    }

    #[tokio::test]
    async fn test_place_bet_debits_and_starts_round() {
        let mut h = harness(1000, vec![1, 2, 3, 4, 6, 6]);
        let report = h.session.place_bet(100).await.unwrap();
        assert_eq!(report.snapshot.state.phase, Phase::Rolling);
        assert_eq!(h.ledger.balance().await.unwrap(), 900);
    }

    #[tokio::test]
    async fn test_insufficient_balance_stays_in_betting() {
        let mut h = harness(50, vec![]);
        let err = h.session.place_bet(100).await.unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientBalance {
                requested: 100,
                available: 50
            }
        );
        assert_eq!(h.session.phase(), Phase::Betting);
        assert_eq!(h.sink.messages(), vec![MSG_INSUFFICIENT_BALANCE.to_string()]);
    }

    #[tokio::test]
    async fn test_debit_failure_stays_in_betting() {
        let mut h = harness(1000, vec![]);
        h.ledger.set_fail_debits(true);
        let err = h.session.place_bet(100).await.unwrap_err();
        assert!(matches!(err, GameError::LedgerDebitFailed(_)));
        assert_eq!(h.session.phase(), Phase::Betting);
        assert_eq!(h.ledger.balance().await.unwrap(), 1000);
        assert_eq!(h.sink.messages(), vec![MSG_DEBIT_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_bet_below_minimum_is_rejected_without_debit() {
        let mut h = harness(1000, vec![]);
        assert_eq!(h.session.place_bet(10).await, Err(GameError::InvalidBet(10)));
        assert_eq!(h.session.place_bet(0).await, Err(GameError::InvalidBet(0)));
        assert_eq!(h.session.phase(), Phase::Betting);
        assert_eq!(h.ledger.balance().await.unwrap(), 1000);
        assert_eq!(h.session.bet_slip().amount(), 100);

        let report = h.session.place_bet(50).await.unwrap();
        assert_eq!(report.snapshot.state.stake, 50);
        assert_eq!(h.session.bet_slip().amount(), 50);
    }

    #[tokio::test]
    async fn test_empty_reroll_notifies() {
        let mut h = harness(1000, vec![1, 2, 3, 4, 6, 6]);
        h.session.place_bet(100).await.unwrap();
        assert_eq!(h.session.roll_again().await, Err(GameError::EmptySelectionReroll));
        assert_eq!(h.sink.messages(), vec![MSG_EMPTY_SELECTION.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_win_credits_records_and_schedules_reset() {
        let mut h = harness(1000, vec![4, 4, 4, 4, 4, 4]);
        let report = win_with_six_fours(&mut h).await.unwrap();

        assert!(reset_scheduled(&report.events));
        assert_eq!(report.snapshot.state.phase, Phase::Finished);
        assert!(report.snapshot.state.pending_settlement.is_none());
        assert_eq!(h.ledger.balance().await.unwrap(), 1100);

        let entries = h.history.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, GameOutcome::Win);
        assert_eq!(entries[0].win_amount, 200);
        assert!(h.sink.messages()[0].contains("won 200 credits"));

        // nothing happens before the delay elapses
        tokio::time::advance(Duration::from_millis(2_999)).await;
        assert!(h.session.tick(Instant::now()).unwrap().is_none());
        assert_eq!(h.session.phase(), Phase::Finished);

        tokio::time::advance(Duration::from_millis(1)).await;
        let reset = h.session.tick(Instant::now()).unwrap().unwrap();
        assert_eq!(reset.events, vec![GameEvent::RoundReset]);
        assert_eq!(h.session.phase(), Phase::Betting);
        assert!(h.session.reset_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_credit_failure_leaves_settlement_pending() {
        let mut h = harness(1000, vec![4, 4, 4, 4, 4, 4]);
        h.ledger.set_fail_credits(true);

        let err = win_with_six_fours(&mut h).await.unwrap_err();
        assert!(matches!(err, GameError::LedgerCreditFailed(_)));
        assert_eq!(h.sink.messages(), vec![MSG_CREDIT_FAILED.to_string()]);
        assert_eq!(h.session.phase(), Phase::Finished);
        assert!(h.session.machine().pending_settlement().is_some());
        assert!(h.session.reset_deadline().is_none());
        assert_eq!(h.ledger.balance().await.unwrap(), 900);

        h.ledger.set_fail_credits(false);
        let report = h.session.retry_settlement().await.unwrap();
        assert!(reset_scheduled(&report.events));
        let messages = h.sink.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], MSG_CREDIT_FAILED);
        assert!(messages[1].contains("won 200 credits"));
        assert_eq!(h.ledger.balance().await.unwrap(), 1100);
        // history is recorded once, not per attempt
        assert_eq!(h.history.entries().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_farkle_settles_without_credit() {
        let mut h = harness(1000, vec![1, 2, 3, 4, 6, 6, 1, 2, 3, 4, 6, 6]);
        h.session.place_bet(100).await.unwrap();
        h.session.toggle_selection(0).unwrap();
        let report = h.session.roll_again().await.unwrap();

        assert_eq!(report.snapshot.state.outcome, Some(GameOutcome::Loss));
        assert!(reset_scheduled(&report.events));
        assert_eq!(h.ledger.balance().await.unwrap(), 900);
        assert_eq!(h.sink.messages(), vec![MSG_FARKLE.to_string()]);
        assert_eq!(h.history.entries().await[0].win_amount, 0);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_block_settlement() {
        let mut h = harness(1000, vec![4, 4, 4, 4, 4, 4]);
        h.history.set_fail(true);
        let report = win_with_six_fours(&mut h).await.unwrap();
        assert!(reset_scheduled(&report.events));
        assert_eq!(h.ledger.balance().await.unwrap(), 1100);
    }

    #[tokio::test]
    async fn test_bet_slip_adjustments() {
        let mut h = harness(120, vec![]);
        assert_eq!(h.session.increase_bet().await.unwrap(), 150);
        assert_eq!(h.session.increase_bet().await.unwrap(), 150);
        assert_eq!(h.session.decrease_bet().unwrap(), 100);
        assert_eq!(h.session.decrease_bet().unwrap(), 50);
        assert_eq!(h.session.decrease_bet().unwrap(), 50);

        let report = h.session.place_current_bet().await.unwrap();
        assert_eq!(report.snapshot.state.stake, 50);
        assert!(h.session.decrease_bet().is_err());
    }
}
