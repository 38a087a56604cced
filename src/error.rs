//! Error types
//!
//! Only setup and bet placement can fail. Invalid transition requests are
//! silent no-ops and never surface here.

use thiserror::Error;

use crate::sim::RoundPhase;

/// A tunable is out of range or the config could not be parsed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be within 0..=1 (got {value})")]
    RatioOutOfRange { field: &'static str, value: f32 },
    #[error("wait_on_table_ratio + float_duration_ratio exceeds 1 ({sum})")]
    RatiosExceedRound { sum: f32 },
    #[error("{field} must be at most {max} (got {value})")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
    #[error("goal_multiplier must be at least 1 (got {0})")]
    GoalMultiplier(i64),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The round state machine could not be wired
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("expected {expected} dice collaborators, got {got}")]
    DiceCount { expected: usize, got: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A bet could not be placed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BetError {
    #[error("bets can only be placed while Ready (phase is {0:?})")]
    WrongPhase(RoundPhase),
    #[error("wager must be positive (got {0})")]
    ZeroWager(i64),
    #[error("wager {wager} exceeds gold {gold}")]
    InsufficientGold { wager: i64, gold: i64 },
    #[error("NoBet cannot carry a wager")]
    NoBetWithWager,
}
