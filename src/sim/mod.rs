//! Deterministic round simulation
//!
//! Round phases and timers, the suspicion detector, dice collaborators
//! and the tick scheduler.

pub mod dice;
pub mod round;
pub mod state;
pub mod suspicion;
pub mod tick;

#[cfg(test)]
pub(crate) mod testing;

pub use dice::{Die, DieState, SimDie};
pub use round::{FloatBack, RoundStateMachine, SessionSummary, Trigger, next_phase};
pub use state::{AbilityKind, Account, BetType, DicePair, Ending, RoundOutcome, RoundPhase};
pub use suspicion::{Assessment, SuspicionEngine, SuspicionLevel, SuspicionTrigger};
pub use tick::{AbilityCommand, Scheduler, TickInput, fixed_tick, frame_tick};
