//! One-way notifications out of the round machine
//!
//! Nothing here is ever read back.

use crate::sim::{BetType, Ending, SuspicionLevel};

pub trait Presenter {
    /// Dice settled: the total, the bet and whether it won
    fn show_outcome(&mut self, total: u8, bet: BetType, did_win: bool);
    fn show_suspicion_level(&mut self, level: SuspicionLevel);
    fn show_gold(&mut self, gold: i64);
    fn show_wins(&mut self, wins: u32);
    /// Win or lose screen
    fn show_end(&mut self, ending: Ending);
}

/// Presenter that writes everything to the log
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_outcome(&mut self, total: u8, bet: BetType, did_win: bool) {
        match bet {
            BetType::NoBet => log::info!("Dice total: {}", total),
            _ if did_win => log::info!("Dice total: {} - {:?} won", total, bet),
            _ => log::info!("Dice total: {} - {:?} lost", total, bet),
        }
    }

    fn show_suspicion_level(&mut self, level: SuspicionLevel) {
        log::info!("Suspicion: {}", level.as_str());
    }

    fn show_gold(&mut self, gold: i64) {
        log::info!("Gold: {}", gold);
    }

    fn show_wins(&mut self, wins: u32) {
        log::info!("Wins: {}", wins);
    }

    fn show_end(&mut self, ending: Ending) {
        if ending.is_win() {
            log::info!("YOU WIN: {:?}", ending);
        } else {
            log::info!("GAME OVER: {:?}", ending);
        }
    }
}
