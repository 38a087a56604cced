//! Headless demo session
//!
//! Usage: rigged-roll [seed] [--cheat] [--config path.json] [--max-rounds n]
//!
//! The friendly gambler places every bet. With `--cheat` the player freezes
//! each throw and anchors faces so the bet wins, which the house notices.

use std::path::PathBuf;

use clap::Parser;
use rigged_roll::consts::SIM_DT;
use rigged_roll::sim::{
    AbilityCommand, AbilityKind, BetType, Die, RoundPhase, RoundStateMachine, Scheduler, SimDie,
    TickInput,
};
use rigged_roll::{FriendlyGambler, LogPresenter, RoundConfig};

/// Render-rate frame time the demo pretends to run at
const FRAME_DT: f32 = 1.0 / 60.0;
/// Seconds the cheater holds each freeze
const CHEAT_FREEZE: f32 = 1.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the dice and the friendly gambler
    #[arg(default_value_t = 12345)]
    seed: u64,

    /// Freeze every throw and anchor winning faces
    #[arg(long)]
    cheat: bool,

    /// Round config JSON (defaults are used when omitted)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stop after this many rounds even if the session has not ended
    #[arg(long, value_name = "N", default_value_t = 200)]
    max_rounds: u32,
}

/// Faces that make a bet win
fn winning_faces(bet: BetType) -> Option<(u8, u8)> {
    match bet {
        BetType::NoBet => None,
        BetType::Over7 => Some((6, 6)),
        BetType::Under7 => Some((1, 2)),
        BetType::Exactly7 => Some((3, 4)),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Rigged Roll (headless) starting with seed {}", args.seed);

    let config = match &args.config {
        Some(path) => match RoundConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            }
        },
        None => RoundConfig::default(),
    };

    let dice: Vec<Box<dyn Die>> = vec![
        Box::new(SimDie::new("Die 1", args.seed).with_settle_time(config.settle_time_threshold)),
        Box::new(
            SimDie::new("Die 2", args.seed.wrapping_add(1))
                .with_settle_time(config.settle_time_threshold),
        ),
    ];
    let mut machine = match RoundStateMachine::new(config, dice, Box::new(LogPresenter)) {
        Ok(machine) => machine,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let mut gambler = FriendlyGambler::new(args.seed.wrapping_add(2));
    let mut scheduler = Scheduler::new();
    let mut froze_this_throw = false;

    while machine.phase() != RoundPhase::End && machine.rounds_played() < args.max_rounds {
        let mut input = TickInput::default();
        match machine.phase() {
            RoundPhase::Ready => {
                input.bet = Some((gambler.choose_bet(), gambler.choose_wager()));
                input.begin_round = true;
                froze_this_throw = false;
            }
            RoundPhase::Rolling if args.cheat && !froze_this_throw => {
                input.freeze = Some(CHEAT_FREEZE);
                froze_this_throw = true;
            }
            RoundPhase::TimeFreeze => {
                // One anchor per die, then let the dice fall
                let kind = AbilityKind::StickyAnchor;
                let used = machine
                    .config()
                    .sticky_uses_per_round
                    .saturating_sub(machine.abilities_remaining(kind)) as usize;
                match winning_faces(machine.account().current_bet) {
                    Some((f1, f2)) if used < 2 && machine.can_use_ability(kind) => {
                        let face = if used == 0 { f1 } else { f2 };
                        input.ability = Some(AbilityCommand {
                            kind,
                            die: used,
                            face,
                        });
                    }
                    _ => input.unfreeze = true,
                }
            }
            _ => {}
        }
        scheduler.update(&mut machine, &input, FRAME_DT);
    }

    log::info!(
        "Simulated {} fixed ticks ({:.1}s)",
        scheduler.fixed_ticks,
        scheduler.fixed_ticks as f32 * SIM_DT
    );
    match serde_json::to_string_pretty(&machine.summary()) {
        Ok(json) => println!("{}", json),
        Err(err) => log::error!("Could not serialize summary: {}", err),
    }
}
