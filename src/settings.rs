//! Round and detector tunables
//!
//! Read-only at runtime. Loaded from JSON when a file is given, otherwise
//! the defaults below are used. Never written back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Suspicion level change applied when each detector rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionDeltas {
    /// Three wins in a row, each at 100% of gold
    pub win_streak_all_in: i32,
    /// Four wins in a row, each at 50% of gold
    pub win_streak_half: i32,
    /// Five wins in a row, each at 25% of gold
    pub win_streak_quarter: i32,
    /// Two losses in a row, each at 25% of gold
    pub loss_streak_quarter: i32,
    /// Latest loss at 50% of gold
    pub loss_half: i32,
    /// Same bet type too many rounds in a row
    pub same_bet: i32,
    /// Repeated Exactly-7 wins inside the history window
    pub exactly7_jackpot: i32,
    /// Identical die pair two rounds running
    pub repeat_roll: i32,
}

impl Default for SuspicionDeltas {
    fn default() -> Self {
        Self {
            win_streak_all_in: 2,
            win_streak_half: 2,
            win_streak_quarter: 2,
            loss_streak_quarter: -2,
            loss_half: -2,
            same_bet: 1,
            exactly7_jackpot: 4,
            repeat_roll: 1,
        }
    }
}

/// Everything tunable about a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    // === Round timing (seconds) ===
    /// Total time from results to the next throw
    pub round_end_time: f32,
    /// Share of `round_end_time` the dice rest on the table before floating back
    pub wait_on_table_ratio: f32,
    /// Share of `round_end_time` the float-back animation takes
    pub float_duration_ratio: f32,
    /// Upper bound on a single time freeze
    pub time_freeze_maximum_duration: f32,
    /// Rest dwell before a die reports Stopped
    pub settle_time_threshold: f32,

    // === Abilities ===
    pub sticky_uses_per_round: u32,
    pub repulsion_uses_per_round: u32,

    // === Detector ===
    pub exactly7_history_length: usize,
    pub suspicion_deltas: SuspicionDeltas,

    // === Economy ===
    pub starting_gold: i64,
    /// Session is won once gold reaches `starting_gold * goal_multiplier`
    pub goal_multiplier: i64,
    /// Disables the goal-reached ending only
    pub endless: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_end_time: ROUND_END_TIME,
            wait_on_table_ratio: WAIT_ON_TABLE_RATIO,
            float_duration_ratio: FLOAT_DURATION_RATIO,
            time_freeze_maximum_duration: TIME_FREEZE_MAXIMUM_DURATION,
            settle_time_threshold: SETTLE_TIME_THRESHOLD,

            sticky_uses_per_round: STICKY_USES_PER_ROUND,
            repulsion_uses_per_round: REPULSION_USES_PER_ROUND,

            exactly7_history_length: EXACTLY7_HISTORY_LENGTH,
            suspicion_deltas: SuspicionDeltas::default(),

            starting_gold: STARTING_GOLD,
            goal_multiplier: GOAL_MULTIPLIER,
            endless: false,
        }
    }
}

impl RoundConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded round config from {}", path.display());
        Ok(config)
    }

    /// Check every tunable is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("round_end_time", self.round_end_time)?;
        ensure_positive("time_freeze_maximum_duration", self.time_freeze_maximum_duration)?;
        ensure_positive("settle_time_threshold", self.settle_time_threshold)?;
        ensure_ratio("wait_on_table_ratio", self.wait_on_table_ratio)?;
        ensure_ratio("float_duration_ratio", self.float_duration_ratio)?;

        let sum = self.wait_on_table_ratio + self.float_duration_ratio;
        if sum > 1.0 {
            return Err(ConfigError::RatiosExceedRound { sum });
        }
        if self.exactly7_history_length == 0 {
            return Err(ConfigError::NotPositive {
                field: "exactly7_history_length",
                value: 0.0,
            });
        }
        if self.exactly7_history_length > MAX_EXACTLY7_HISTORY_LENGTH {
            return Err(ConfigError::TooLarge {
                field: "exactly7_history_length",
                value: self.exactly7_history_length,
                max: MAX_EXACTLY7_HISTORY_LENGTH,
            });
        }
        if self.starting_gold <= 0 {
            return Err(ConfigError::NotPositive {
                field: "starting_gold",
                value: self.starting_gold as f64,
            });
        }
        if self.goal_multiplier < 1 {
            return Err(ConfigError::GoalMultiplier(self.goal_multiplier));
        }
        Ok(())
    }

    /// Countdown value at which the dice start floating back
    pub fn float_start_time(&self) -> f32 {
        self.round_end_time * (1.0 - self.wait_on_table_ratio)
    }

    /// Length of the float-back animation
    pub fn float_duration(&self) -> f32 {
        self.round_end_time * self.float_duration_ratio
    }

    /// Gold that ends the session as a win (ignored in endless mode)
    pub fn goal_gold(&self) -> i64 {
        self.starting_gold.saturating_mul(self.goal_multiplier)
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    // NaN fails this too
    if !(value > 0.0) {
        return Err(ConfigError::NotPositive {
            field,
            value: value as f64,
        });
    }
    Ok(())
}

fn ensure_ratio(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RatioOutOfRange { field, value });
    }
    Ok(())
}
