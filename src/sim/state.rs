//! Round data types
//!
//! Phases, bets, dice pairs, the per-round outcome handed to the detector,
//! and the player's gold/bet record.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::BetError;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting for a bet and the throw
    #[default]
    Ready,
    /// Dice are in motion
    Rolling,
    /// Dice settled, outcome shown, countdown to the next throw running
    Results,
    /// Dice halted mid-roll; abilities can be used
    TimeFreeze,
    /// Session over
    End,
}

/// What the player is betting the total will be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BetType {
    #[default]
    NoBet,
    Over7,
    Under7,
    Exactly7,
}

impl BetType {
    /// Whether a dice total wins this bet. `NoBet` never wins.
    pub fn wins_on(&self, total: u8) -> bool {
        match self {
            BetType::NoBet => false,
            BetType::Over7 => total > PIVOT_TOTAL,
            BetType::Under7 => total < PIVOT_TOTAL,
            BetType::Exactly7 => total == PIVOT_TOTAL,
        }
    }

    /// Winnings multiplier applied to the wager
    pub fn payout(&self) -> i64 {
        match self {
            BetType::NoBet => 0,
            BetType::Over7 | BetType::Under7 => EVEN_PAYOUT,
            BetType::Exactly7 => EXACTLY7_PAYOUT,
        }
    }
}

/// Top faces of the two dice after they settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePair {
    pub die1: u8,
    pub die2: u8,
}

impl DicePair {
    pub fn new(die1: u8, die2: u8) -> Self {
        Self { die1, die2 }
    }

    pub fn total(&self) -> u8 {
        crate::dice_total(self.die1, self.die2)
    }

    /// Same faces regardless of which die shows which
    pub fn same_faces(&self, other: &DicePair) -> bool {
        (self.die1 == other.die1 && self.die2 == other.die2)
            || (self.die1 == other.die2 && self.die2 == other.die1)
    }
}

/// Everything the detector needs to know about one resolved round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub bet_type: BetType,
    pub wager_amount: i64,
    /// Gold held before this round's win/loss was applied
    pub gold_before_round: i64,
    pub did_win: bool,
    pub die1: u8,
    pub die2: u8,
}

impl RoundOutcome {
    pub fn dice(&self) -> DicePair {
        DicePair::new(self.die1, self.die2)
    }

    /// Wager over pre-round gold (0.0 if gold was not positive)
    pub fn wager_fraction(&self) -> f64 {
        crate::wager_fraction(self.wager_amount, self.gold_before_round).unwrap_or(0.0)
    }
}

/// Cheating abilities usable while time is frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Anchor a face to the table so it lands up
    StickyAnchor,
    /// Nudge a face away so it does not land up
    RepulsionNudge,
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ending {
    /// Gold reached the goal
    GoalReached,
    /// Gold ran out
    Bankrupt,
    /// Suspicion hit the top rank
    CaughtCheating,
}

impl Ending {
    /// Whether the player sees the win screen
    pub fn is_win(&self) -> bool {
        matches!(self, Ending::GoalReached)
    }
}

/// The player's gold and bet record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub gold: i64,
    pub starting_gold: i64,
    pub current_bet: BetType,
    pub current_wager: i64,
    pub wins_count: u32,
}

impl Account {
    pub fn new(starting_gold: i64) -> Self {
        Self {
            gold: starting_gold,
            starting_gold,
            current_bet: BetType::NoBet,
            current_wager: 0,
            wins_count: 0,
        }
    }

    /// Clear the bet for a fresh betting phase
    pub fn clear_bet(&mut self) {
        self.current_bet = BetType::NoBet;
        self.current_wager = 0;
    }

    /// Record a bet after checking it is affordable
    pub fn set_bet(&mut self, bet: BetType, wager: i64) -> Result<(), BetError> {
        if bet == BetType::NoBet {
            if wager != 0 {
                return Err(BetError::NoBetWithWager);
            }
        } else if wager <= 0 {
            return Err(BetError::ZeroWager(wager));
        } else if wager > self.gold {
            return Err(BetError::InsufficientGold {
                wager,
                gold: self.gold,
            });
        }
        self.current_bet = bet;
        self.current_wager = wager;
        Ok(())
    }

    /// Apply the round's win/loss to gold, returning the signed change
    pub fn settle(&mut self, did_win: bool) -> i64 {
        let delta = match (self.current_bet, did_win) {
            (BetType::NoBet, _) => 0,
            (bet, true) => self.current_wager.saturating_mul(bet.payout()),
            (_, false) => -self.current_wager,
        };
        self.gold = self.gold.saturating_add(delta);
        if did_win {
            self.wins_count += 1;
        }
        delta
    }
}
