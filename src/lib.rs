//! Dice10k - single-player "10,000" dice game engine
//!
//! Six dice, a stake and a running score. The player keeps selecting
//! scoring dice and either rolls on or banks, trying to reach 10,000 before
//! a roll comes up with nothing that scores.
//!
//! The core is [`games::RoundStateMachine`], a synchronous state machine
//! over a serializable [`games::RoundState`]. [`games::GameSession`] wraps it
//! with the async collaborators from [`common::traits`]: a ledger for the
//! balance, a history log and a notification sink.

pub mod common;
pub mod config;
pub mod errors;
pub mod games;
pub mod logging;

pub use config::GameConfig;
pub use errors::{DiceResult, GameError};
pub use games::{
    ActionReport, GameEvent, GameSession, Phase, RandomDieSource, RoundSnapshot, RoundState,
    RoundStateMachine,
};
