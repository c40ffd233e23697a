//! Dice game engine: scoring, rules, the round state machine and the async
//! session that connects it to a ledger.

pub mod bet;
pub mod dice_source;
pub mod round;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod settlement;
pub mod simulation;
pub mod types;

pub use bet::BetSlip;
pub use dice_source::{ProvablyFairDieSource, RandomDieSource, RngDieSource, ScriptedDieSource};
pub use round::{ActionReport, GameEvent, RoundSnapshot, RoundStateMachine};
pub use rules::{can_bank, check_bank, BankBlocker};
pub use scoring::{has_scoring_dice, score, scoring_indices};
pub use session::GameSession;
pub use settlement::OutcomeResolver;
pub use simulation::{simulate, SimulationConfig, SimulationReport, Simulator};
pub use types::*;
