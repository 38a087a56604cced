//! Betting-pattern cheat detector
//!
//! Called once per resolved round. Tracks win/loss streaks with the wager
//! fraction used in each, how long the same bet has been repeated, recent
//! Exactly-7 wins and the previous die pair, and moves the suspicion level
//! up or down when a pattern matches. Deterministic given prior state and
//! the outcome.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::{BetType, DicePair, RoundOutcome};
use crate::settings::{RoundConfig, SuspicionDeltas};

/// Wager fractions closer than this to a rule threshold count as equal
const FRACTION_EPSILON: f64 = 1e-9;

/// How suspicious the house is of the player, lowest to highest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum SuspicionLevel {
    #[default]
    NotSuspicious,
    CuriousGlance,
    Suspicious,
    GettingAngry,
    Accusatory,
    CaughtCheating,
}

impl SuspicionLevel {
    pub const ALL: [SuspicionLevel; 6] = [
        SuspicionLevel::NotSuspicious,
        SuspicionLevel::CuriousGlance,
        SuspicionLevel::Suspicious,
        SuspicionLevel::GettingAngry,
        SuspicionLevel::Accusatory,
        SuspicionLevel::CaughtCheating,
    ];

    /// Integer encoding, 0 (NotSuspicious) to 5 (CaughtCheating)
    pub fn rank(self) -> i32 {
        self as i32
    }

    /// Level for a rank, clamped into the scale
    pub fn from_rank(rank: i32) -> Self {
        let max = Self::ALL.len() as i32 - 1;
        Self::ALL[rank.clamp(0, max) as usize]
    }

    pub fn is_caught(self) -> bool {
        self == SuspicionLevel::CaughtCheating
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuspicionLevel::NotSuspicious => "Not Suspicious",
            SuspicionLevel::CuriousGlance => "Curious Glance",
            SuspicionLevel::Suspicious => "Suspicious",
            SuspicionLevel::GettingAngry => "Getting Angry",
            SuspicionLevel::Accusatory => "Accusatory",
            SuspicionLevel::CaughtCheating => "Caught Cheating",
        }
    }
}

/// Current win or loss run and the wager fraction of each round in it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    /// One entry per round of the active win streak
    pub win_fractions: Vec<f64>,
    /// One entry per round of the active loss streak
    pub loss_fractions: Vec<f64>,
}

impl StreakState {
    /// Extend the matching streak and end the opposite one
    pub fn record(&mut self, did_win: bool, fraction: f64) {
        if did_win {
            self.consecutive_wins += 1;
            self.win_fractions.push(fraction);
            self.reset_losses();
        } else {
            self.consecutive_losses += 1;
            self.loss_fractions.push(fraction);
            self.reset_wins();
        }
    }

    pub fn reset_wins(&mut self) {
        self.consecutive_wins = 0;
        self.win_fractions.clear();
    }

    pub fn reset_losses(&mut self) {
        self.consecutive_losses = 0;
        self.loss_fractions.clear();
    }

    /// Win streak is exactly `len` rounds long, every one at `fraction`
    fn wins_match(&self, len: u32, fraction: f64) -> bool {
        self.consecutive_wins == len && all_at(&self.win_fractions, fraction)
    }

    fn losses_match(&self, len: u32, fraction: f64) -> bool {
        self.consecutive_losses == len && all_at(&self.loss_fractions, fraction)
    }

    fn last_loss_at(&self, fraction: f64) -> bool {
        self.consecutive_losses > 0
            && self
                .loss_fractions
                .last()
                .is_some_and(|f| fraction_eq(*f, fraction))
    }
}

/// How many rounds in a row the same bet type was placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetConsistencyState {
    pub last_bet_type: BetType,
    pub consecutive_same_bet_count: u32,
}

impl Default for BetConsistencyState {
    fn default() -> Self {
        Self {
            last_bet_type: BetType::NoBet,
            consecutive_same_bet_count: 0,
        }
    }
}

impl BetConsistencyState {
    pub fn record(&mut self, bet: BetType) {
        if bet != BetType::NoBet && bet == self.last_bet_type {
            self.consecutive_same_bet_count += 1;
        } else {
            self.consecutive_same_bet_count = 1;
        }
        self.last_bet_type = bet;
    }
}

/// Fixed-capacity FIFO of "won on an Exactly-7 bet" flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exactly7Window {
    capacity: usize,
    hits: VecDeque<bool>,
}

impl Exactly7Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hits: VecDeque::new(),
        }
    }

    /// Push the newest round, dropping the oldest past capacity
    pub fn push(&mut self, hit: bool) {
        self.hits.push_back(hit);
        while self.hits.len() > self.capacity {
            self.hits.pop_front();
        }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.iter().filter(|hit| **hit).count()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }
}

/// A detector rule that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspicionTrigger {
    WinStreakAllIn,
    WinStreakHalf,
    WinStreakQuarter,
    LossStreakQuarter,
    LossHalf,
    SameBet,
    Exactly7Jackpot,
    RepeatRoll,
}

impl SuspicionTrigger {
    pub fn delta(&self, deltas: &SuspicionDeltas) -> i32 {
        match self {
            SuspicionTrigger::WinStreakAllIn => deltas.win_streak_all_in,
            SuspicionTrigger::WinStreakHalf => deltas.win_streak_half,
            SuspicionTrigger::WinStreakQuarter => deltas.win_streak_quarter,
            SuspicionTrigger::LossStreakQuarter => deltas.loss_streak_quarter,
            SuspicionTrigger::LossHalf => deltas.loss_half,
            SuspicionTrigger::SameBet => deltas.same_bet,
            SuspicionTrigger::Exactly7Jackpot => deltas.exactly7_jackpot,
            SuspicionTrigger::RepeatRoll => deltas.repeat_roll,
        }
    }
}

/// Result of assessing one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub previous: SuspicionLevel,
    pub level: SuspicionLevel,
    /// Rules whose delta was applied, in evaluation order
    pub triggers: Vec<SuspicionTrigger>,
    /// Set only on the call that first reached CaughtCheating
    pub caught: bool,
}

impl Assessment {
    fn unchanged(level: SuspicionLevel) -> Self {
        Self {
            previous: level,
            level,
            triggers: Vec::new(),
            caught: false,
        }
    }

    pub fn level_changed(&self) -> bool {
        self.previous != self.level
    }
}

/// The detector. Owns every piece of history it looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspicionEngine {
    deltas: SuspicionDeltas,
    level: SuspicionLevel,
    streak: StreakState,
    bets: BetConsistencyState,
    exactly7: Exactly7Window,
    last_roll: Option<DicePair>,
    caught_signaled: bool,
}

impl SuspicionEngine {
    pub fn new(config: &RoundConfig) -> Self {
        Self::with_deltas(config.suspicion_deltas, config.exactly7_history_length)
    }

    pub fn with_deltas(deltas: SuspicionDeltas, exactly7_history_length: usize) -> Self {
        Self {
            deltas,
            level: SuspicionLevel::NotSuspicious,
            streak: StreakState::default(),
            bets: BetConsistencyState::default(),
            exactly7: Exactly7Window::new(exactly7_history_length),
            last_roll: None,
            caught_signaled: false,
        }
    }

    pub fn level(&self) -> SuspicionLevel {
        self.level
    }

    pub fn is_caught(&self) -> bool {
        self.level.is_caught()
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn bet_consistency(&self) -> &BetConsistencyState {
        &self.bets
    }

    pub fn exactly7_window(&self) -> &Exactly7Window {
        &self.exactly7
    }

    pub fn last_roll(&self) -> Option<DicePair> {
        self.last_roll
    }

    /// Fold one resolved round into the history and re-rate the player.
    ///
    /// `outcome.gold_before_round` must be the gold held before this round's
    /// win/loss was applied. Once CaughtCheating is reached every later call
    /// returns the unchanged level.
    pub fn assess_round(&mut self, outcome: &RoundOutcome) -> Assessment {
        if self.level.is_caught() {
            return Assessment::unchanged(self.level);
        }
        let mut assessment = Assessment::unchanged(self.level);

        self.streak.record(outcome.did_win, outcome.wager_fraction());
        self.bets.record(outcome.bet_type);
        self.exactly7
            .push(outcome.did_win && outcome.bet_type == BetType::Exactly7);

        // Win streak rules, first match only
        if self.streak.wins_match(3, 1.0) {
            self.apply(SuspicionTrigger::WinStreakAllIn, &mut assessment);
            self.streak.reset_wins();
        } else if self.streak.wins_match(4, 0.5) {
            self.apply(SuspicionTrigger::WinStreakHalf, &mut assessment);
            self.streak.reset_wins();
        } else if self.streak.wins_match(5, 0.25) {
            self.apply(SuspicionTrigger::WinStreakQuarter, &mut assessment);
            self.streak.reset_wins();
        }

        // Loss streak rules, first match only
        if self.streak.losses_match(2, 0.25) {
            self.apply(SuspicionTrigger::LossStreakQuarter, &mut assessment);
            self.streak.reset_losses();
        } else if self.streak.last_loss_at(0.5) {
            self.apply(SuspicionTrigger::LossHalf, &mut assessment);
            self.streak.reset_losses();
        }

        if self.bets.consecutive_same_bet_count >= 4 {
            self.apply(SuspicionTrigger::SameBet, &mut assessment);
            self.bets.consecutive_same_bet_count = 0;
        }

        if self.exactly7.hit_count() >= 2 {
            self.apply(SuspicionTrigger::Exactly7Jackpot, &mut assessment);
            self.exactly7.clear();
        }

        let roll = outcome.dice();
        if self.last_roll.is_some_and(|last| last.same_faces(&roll)) {
            self.apply(SuspicionTrigger::RepeatRoll, &mut assessment);
        }
        self.last_roll = Some(roll);

        assessment.level = self.level;
        if self.level.is_caught() && !self.caught_signaled {
            self.caught_signaled = true;
            assessment.caught = true;
            log::error!("Caught cheating after {:?}", assessment.triggers);
        } else if assessment.level_changed() {
            log::info!(
                "Suspicion {} -> {}",
                assessment.previous.as_str(),
                assessment.level.as_str()
            );
        }
        assessment
    }

    /// Apply one rule's delta, clamped. No-op once caught.
    fn apply(&mut self, trigger: SuspicionTrigger, assessment: &mut Assessment) {
        if self.level.is_caught() {
            return;
        }
        let delta = trigger.delta(&self.deltas);
        log::warn!("Suspicion event: {:?} ({:+})", trigger, delta);
        self.level = SuspicionLevel::from_rank(self.level.rank().saturating_add(delta));
        assessment.triggers.push(trigger);
    }
}

fn fraction_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < FRACTION_EPSILON
}

fn all_at(fractions: &[f64], target: f64) -> bool {
    !fractions.is_empty() && fractions.iter().all(|f| fraction_eq(*f, target))
}
