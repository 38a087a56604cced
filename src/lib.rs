//! Rigged Roll - Over/Under 7 dice wagering with a cheat detector
//!
//! Core modules:
//! - `sim`: Round lifecycle state machine, suspicion engine, dice collaborators, ticking
//! - `settings`: Tunable round and detector configuration
//! - `presenter`: One-way notifications to whatever shows the game
//! - `gambler`: Friendly gambler NPC and wager choices
//! - `error`: Setup, configuration and betting errors

pub mod error;
pub mod gambler;
pub mod presenter;
pub mod settings;
pub mod sim;

pub use error::{BetError, ConfigError, SetupError};
pub use gambler::{FriendlyGambler, WagerChoice};
pub use presenter::{LogPresenter, Presenter};
pub use settings::{RoundConfig, SuspicionDeltas};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz dice settlement polling)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of physical dice on the table
    pub const DICE_COUNT: usize = 2;
    /// Faces per die
    pub const DIE_FACES: u8 = 6;
    /// The pivot total every bet is measured against
    pub const PIVOT_TOTAL: u8 = 7;

    /// Round timing defaults (seconds)
    pub const ROUND_END_TIME: f32 = 10.0;
    pub const WAIT_ON_TABLE_RATIO: f32 = 0.6;
    pub const FLOAT_DURATION_RATIO: f32 = 0.2;
    pub const TIME_FREEZE_MAXIMUM_DURATION: f32 = 5.0;

    /// Ability uses granted each time the dice are thrown
    pub const STICKY_USES_PER_ROUND: u32 = 2;
    pub const REPULSION_USES_PER_ROUND: u32 = 2;

    /// Rounds remembered by the Exactly-7 jackpot window
    pub const EXACTLY7_HISTORY_LENGTH: usize = 6;
    /// Longest Exactly-7 window a config may ask for
    pub const MAX_EXACTLY7_HISTORY_LENGTH: usize = 1024;

    /// Player economy
    pub const STARTING_GOLD: i64 = 1000;
    pub const GOAL_MULTIPLIER: i64 = 15;
    /// Exactly-7 pays 4:1, Over/Under pay even money
    pub const EXACTLY7_PAYOUT: i64 = 4;
    pub const EVEN_PAYOUT: i64 = 1;

    /// Die considered at rest below these speeds
    pub const REST_LINEAR_SPEED: f32 = 0.1;
    pub const REST_ANGULAR_SPEED: f32 = 0.1;
    /// Time a die must stay at rest before it reports Stopped
    pub const SETTLE_TIME_THRESHOLD: f32 = 0.25;
}

/// Sum of two die faces
#[inline]
pub fn dice_total(die1: u8, die2: u8) -> u8 {
    die1.saturating_add(die2)
}

/// Wager as a fraction of the gold held before the round resolved
///
/// Returns `None` when `gold_before_round` is not positive.
#[inline]
pub fn wager_fraction(wager: i64, gold_before_round: i64) -> Option<f64> {
    if gold_before_round <= 0 {
        return None;
    }
    Some(wager as f64 / gold_before_round as f64)
}
