//! Fixed and variable rate ticks
//!
//! The fixed tick steps dice physics and polls for settlement. The frame
//! tick applies player commands and runs the phase timers. `Scheduler`
//! runs as many fixed ticks as a frame's elapsed time allows.

use super::round::RoundStateMachine;
use super::state::{AbilityKind, BetType};
use crate::consts::*;
use crate::gambler::WagerChoice;

/// An ability aimed at one die's face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityCommand {
    pub kind: AbilityKind,
    pub die: usize,
    pub face: u8,
}

/// Player commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Bet to place (only honoured while Ready)
    pub bet: Option<(BetType, WagerChoice)>,
    /// Throw the dice (new round or reroll)
    pub begin_round: bool,
    /// Freeze time for up to this many seconds
    pub freeze: Option<f32>,
    /// Leave a time freeze early
    pub unfreeze: bool,
    /// Use an ability (only honoured while frozen)
    pub ability: Option<AbilityCommand>,
}

/// Advance dice physics one fixed step and check for settlement
pub fn fixed_tick(machine: &mut RoundStateMachine, dt: f32) {
    machine.step_dice(dt);
    machine.poll_dice();
}

/// Apply commands, then advance timers by the frame's `dt`
pub fn frame_tick(machine: &mut RoundStateMachine, input: &TickInput, dt: f32) {
    if let Some((bet, choice)) = input.bet {
        if let Err(err) = machine.place_wager(bet, choice) {
            log::warn!("Bet rejected: {}", err);
        }
    }
    if input.begin_round {
        machine.begin_round();
    }
    if let Some(duration) = input.freeze {
        machine.start_time_freeze(duration);
    }
    if let Some(cmd) = input.ability {
        machine.use_ability(cmd.kind, cmd.die, cmd.face);
    }
    if input.unfreeze {
        machine.end_time_freeze();
    }
    machine.advance_timers(dt);
}

/// Accumulates frame time into fixed simulation steps
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    accumulator: f32,
    pub fixed_ticks: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns the number of fixed substeps taken.
    pub fn update(&mut self, machine: &mut RoundStateMachine, input: &TickInput, dt: f32) -> u32 {
        let dt = dt.min(0.1);
        frame_tick(machine, input, dt);

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            fixed_tick(machine, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.fixed_ticks += 1;
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
