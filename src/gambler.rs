//! Friendly gambler NPC and wager choices
//!
//! The gambler picks bets for auto-played sessions. Weights: 45% Under 7,
//! 45% Over 7, 10% Exactly 7.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::BetType;

/// Share of current gold put on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WagerChoice {
    Percent25,
    Percent50,
    Percent100,
}

impl WagerChoice {
    pub const ALL: [WagerChoice; 3] = [
        WagerChoice::Percent25,
        WagerChoice::Percent50,
        WagerChoice::Percent100,
    ];

    pub fn percent(&self) -> i64 {
        match self {
            WagerChoice::Percent25 => 25,
            WagerChoice::Percent50 => 50,
            WagerChoice::Percent100 => 100,
        }
    }

    /// Wager for the given gold, truncated to whole coins
    pub fn amount(&self, gold: i64) -> i64 {
        gold.max(0).saturating_mul(self.percent()) / 100
    }
}

/// Seeded NPC bettor
#[derive(Debug, Clone)]
pub struct FriendlyGambler {
    rng: Pcg32,
}

impl FriendlyGambler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn choose_bet(&mut self) -> BetType {
        let roll: f32 = self.rng.random();
        let bet = if roll < 0.45 {
            BetType::Under7
        } else if roll < 0.90 {
            BetType::Over7
        } else {
            BetType::Exactly7
        };
        log::debug!("Friendly gambler bets on {:?}", bet);
        bet
    }

    pub fn choose_wager(&mut self) -> WagerChoice {
        WagerChoice::ALL[self.rng.random_range(0..WagerChoice::ALL.len())]
    }
}
