//! Round lifecycle state machine
//!
//! Every phase change goes through `next_phase`, a from-phase x trigger
//! table checked before anything is mutated. Requests the table does not
//! allow are ignored and reported as `false`.
//!
//! ```text
//! Ready ──begin──▶ Rolling ──dice stopped──▶ Results ──countdown──▶ Ready
//!                   │   ▲                     │  │
//!             freeze│   │expire/unfreeze      │  └──begin──▶ Rolling
//!                   ▼   │                     │
//!                  TimeFreeze                 └──end condition──▶ End
//! ```

use serde::{Deserialize, Serialize};

use super::dice::{Die, DieState};
use super::state::{AbilityKind, Account, BetType, DicePair, Ending, RoundOutcome, RoundPhase};
use super::suspicion::{Assessment, SuspicionEngine, SuspicionLevel};
use crate::consts::DICE_COUNT;
use crate::error::{BetError, SetupError};
use crate::gambler::WagerChoice;
use crate::presenter::Presenter;
use crate::settings::RoundConfig;

/// Things that can move the machine between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Throw the dice (new round, or reroll from Results)
    BeginRound,
    /// Every die reports Stopped
    DiceStopped,
    /// Explicit time freeze request
    Freeze,
    /// Freeze timer ran out
    FreezeExpired,
    /// Explicit unfreeze request
    Unfreeze,
    /// Round-end countdown reached zero
    CountdownElapsed,
    /// Gold or suspicion ended the session
    EndConditionMet,
}

/// The transition table
pub fn next_phase(from: RoundPhase, trigger: Trigger) -> Option<RoundPhase> {
    use RoundPhase::*;
    use Trigger::*;

    match (from, trigger) {
        (Ready | Results, BeginRound) => Some(Rolling),
        (Rolling, DiceStopped) => Some(Results),
        (Rolling, Freeze) => Some(TimeFreeze),
        (TimeFreeze, FreezeExpired | Unfreeze) => Some(Rolling),
        (Results, CountdownElapsed) => Some(Ready),
        (Results, EndConditionMet) => Some(End),
        _ => None,
    }
}

/// Float-back trigger latch plus animation progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatBack {
    initiated: bool,
    elapsed: f32,
    duration: f32,
    running: bool,
}

impl FloatBack {
    /// Start the animation. Only the first call after a reset succeeds.
    pub fn trigger(&mut self, duration: f32) -> bool {
        if self.initiated {
            return false;
        }
        self.initiated = true;
        self.running = true;
        self.elapsed = 0.0;
        self.duration = duration;
        true
    }

    pub fn advance(&mut self, dt: f32) {
        if self.running {
            self.elapsed = (self.elapsed + dt).min(self.duration);
            if self.elapsed >= self.duration {
                self.running = false;
            }
        }
    }

    /// `elapsed / duration` while an animation has been started
    pub fn progress(&self) -> Option<f32> {
        if !self.initiated {
            return None;
        }
        if self.duration <= 0.0 {
            return Some(1.0);
        }
        Some(self.elapsed / self.duration)
    }

    pub fn is_initiated(&self) -> bool {
        self.initiated
    }

    /// Clear progress and re-arm the latch
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

/// Ability uses left this throw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityUses {
    pub sticky: u32,
    pub repulsion: u32,
}

impl AbilityUses {
    fn remaining(&self, kind: AbilityKind) -> u32 {
        match kind {
            AbilityKind::StickyAnchor => self.sticky,
            AbilityKind::RepulsionNudge => self.repulsion,
        }
    }

    fn counter(&mut self, kind: AbilityKind) -> &mut u32 {
        match kind {
            AbilityKind::StickyAnchor => &mut self.sticky,
            AbilityKind::RepulsionNudge => &mut self.repulsion,
        }
    }
}

/// Serializable snapshot of where a session stands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub phase: RoundPhase,
    pub rounds_played: u32,
    pub gold: i64,
    pub starting_gold: i64,
    pub wins: u32,
    pub suspicion: SuspicionLevel,
    pub ending: Option<Ending>,
    pub last_outcome: Option<RoundOutcome>,
}

/// Owns the round phase, its timers, the player's account and the detector,
/// and drives the dice and presentation collaborators it was built with.
pub struct RoundStateMachine {
    config: RoundConfig,
    phase: RoundPhase,
    dice: Vec<Box<dyn Die>>,
    presenter: Box<dyn Presenter>,
    account: Account,
    suspicion: SuspicionEngine,
    /// Counts down from `round_end_time` while in Results
    round_end_timer: f32,
    /// Counts down while in TimeFreeze
    time_freeze_timer: f32,
    float_back: FloatBack,
    abilities: AbilityUses,
    rounds_played: u32,
    ending: Option<Ending>,
    last_outcome: Option<RoundOutcome>,
    last_assessment: Option<Assessment>,
}

impl std::fmt::Debug for RoundStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundStateMachine")
            .field("phase", &self.phase)
            .field("account", &self.account)
            .field("suspicion", &self.suspicion.level())
            .field("round_end_timer", &self.round_end_timer)
            .field("time_freeze_timer", &self.time_freeze_timer)
            .field("rounds_played", &self.rounds_played)
            .field("ending", &self.ending)
            .finish_non_exhaustive()
    }
}

impl RoundStateMachine {
    /// Wire the machine. Fails if the config is out of range or the dice
    /// collaborators are missing.
    pub fn new(
        config: RoundConfig,
        dice: Vec<Box<dyn Die>>,
        presenter: Box<dyn Presenter>,
    ) -> Result<Self, SetupError> {
        if let Err(err) = config.validate() {
            log::error!("Round config rejected: {}", err);
            return Err(err.into());
        }
        if dice.len() != DICE_COUNT {
            let err = SetupError::DiceCount {
                expected: DICE_COUNT,
                got: dice.len(),
            };
            log::error!("Round machine not wired: {}", err);
            return Err(err);
        }

        let mut machine = Self {
            account: Account::new(config.starting_gold),
            suspicion: SuspicionEngine::new(&config),
            config,
            phase: RoundPhase::Ready,
            dice,
            presenter,
            round_end_timer: 0.0,
            time_freeze_timer: 0.0,
            float_back: FloatBack::default(),
            abilities: AbilityUses::default(),
            rounds_played: 0,
            ending: None,
            last_outcome: None,
            last_assessment: None,
        };
        machine.presenter.show_suspicion_level(machine.suspicion.level());
        machine.presenter.show_gold(machine.account.gold);
        Ok(machine)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn suspicion(&self) -> &SuspicionEngine {
        &self.suspicion
    }

    pub fn suspicion_level(&self) -> SuspicionLevel {
        self.suspicion.level()
    }

    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_assessment(&self) -> Option<&Assessment> {
        self.last_assessment.as_ref()
    }

    pub fn round_end_timer(&self) -> f32 {
        self.round_end_timer
    }

    pub fn time_freeze_timer(&self) -> f32 {
        self.time_freeze_timer
    }

    pub fn float_back(&self) -> &FloatBack {
        &self.float_back
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            phase: self.phase,
            rounds_played: self.rounds_played,
            gold: self.account.gold,
            starting_gold: self.account.starting_gold,
            wins: self.account.wins_count,
            suspicion: self.suspicion.level(),
            ending: self.ending,
            last_outcome: self.last_outcome,
        }
    }

    // === Commands ===

    /// Record the player's bet. Only allowed while Ready.
    pub fn place_bet(&mut self, bet: BetType, wager: i64) -> Result<(), BetError> {
        if self.phase != RoundPhase::Ready {
            return Err(BetError::WrongPhase(self.phase));
        }
        self.account.set_bet(bet, wager)?;
        log::info!("Player bet {:?} for {}", bet, wager);
        Ok(())
    }

    /// Bet a share of current gold
    pub fn place_wager(&mut self, bet: BetType, choice: WagerChoice) -> Result<(), BetError> {
        let wager = choice.amount(self.account.gold);
        self.place_bet(bet, wager)
    }

    /// Throw the dice. Allowed from Ready, or from Results to reroll.
    pub fn begin_round(&mut self) -> bool {
        self.fire(Trigger::BeginRound)
    }

    /// Halt the dice mid-roll for up to `time_freeze_maximum_duration`
    pub fn start_time_freeze(&mut self, duration: f32) -> bool {
        if !(duration > 0.0) || next_phase(self.phase, Trigger::Freeze).is_none() {
            return false;
        }
        self.time_freeze_timer = duration.min(self.config.time_freeze_maximum_duration);
        self.fire(Trigger::Freeze)
    }

    /// Leave a time freeze early
    pub fn end_time_freeze(&mut self) -> bool {
        self.fire(Trigger::Unfreeze)
    }

    // === Abilities ===

    pub fn abilities_remaining(&self, kind: AbilityKind) -> u32 {
        self.abilities.remaining(kind)
    }

    /// Abilities work only while time is frozen and uses remain
    pub fn can_use_ability(&self, kind: AbilityKind) -> bool {
        self.phase == RoundPhase::TimeFreeze && self.abilities.remaining(kind) > 0
    }

    /// Spend one use. Ignored when the ability is not usable.
    pub fn notify_ability_used(&mut self, kind: AbilityKind) -> bool {
        if !self.can_use_ability(kind) {
            return false;
        }
        *self.abilities.counter(kind) -= 1;
        log::info!(
            "{:?} used, {} left this throw",
            kind,
            self.abilities.remaining(kind)
        );
        true
    }

    /// Aim an ability at one die's face and spend a use
    pub fn use_ability(&mut self, kind: AbilityKind, die: usize, face: u8) -> bool {
        if !self.can_use_ability(kind) || die >= self.dice.len() {
            return false;
        }
        self.dice[die].apply_ability(kind, face);
        self.notify_ability_used(kind)
    }

    // === Ticking ===

    /// Advance dice physics one fixed step
    pub fn step_dice(&mut self, dt: f32) {
        for die in &mut self.dice {
            die.step(dt);
        }
    }

    /// Move to Results once every die has stopped. Fixed-rate.
    pub fn poll_dice(&mut self) -> bool {
        if self.phase != RoundPhase::Rolling {
            return false;
        }
        if self.dice.iter().all(|die| die.state() == DieState::Stopped) {
            return self.fire(Trigger::DiceStopped);
        }
        false
    }

    /// Run the freeze and round-end timers. Variable-rate.
    pub fn advance_timers(&mut self, dt: f32) {
        match self.phase {
            RoundPhase::TimeFreeze => {
                self.time_freeze_timer -= dt;
                if self.time_freeze_timer <= 0.0 {
                    self.fire(Trigger::FreezeExpired);
                }
            }
            RoundPhase::Results => {
                self.round_end_timer -= dt;
                if self.round_end_timer <= self.config.float_start_time() {
                    let duration = self.config.float_duration();
                    if self.float_back.trigger(duration) {
                        for die in &mut self.dice {
                            die.start_return_animation(duration);
                        }
                        log::debug!("Dice floating back over {:.2}s", duration);
                    }
                }
                if self.round_end_timer <= 0.0 {
                    self.fire(Trigger::CountdownElapsed);
                }
            }
            _ => {}
        }
        self.float_back.advance(dt);
    }

    // === Transitions ===

    fn fire(&mut self, trigger: Trigger) -> bool {
        let Some(next) = next_phase(self.phase, trigger) else {
            log::trace!("Ignoring {:?} while {:?}", trigger, self.phase);
            return false;
        };
        let previous = self.phase;
        self.phase = next;
        log::info!("Round phase {:?} -> {:?}", previous, next);
        self.enter(previous, next);
        true
    }

    fn enter(&mut self, previous: RoundPhase, next: RoundPhase) {
        match next {
            RoundPhase::Rolling if previous == RoundPhase::TimeFreeze => {
                self.time_freeze_timer = 0.0;
                for die in &mut self.dice {
                    die.unfreeze();
                }
            }
            RoundPhase::Rolling => self.throw_dice(),
            RoundPhase::TimeFreeze => {
                for die in &mut self.dice {
                    die.freeze();
                }
            }
            RoundPhase::Results => {
                self.round_end_timer = self.config.round_end_time;
                self.resolve_round();
            }
            RoundPhase::Ready => {
                self.round_end_timer = 0.0;
                self.account.clear_bet();
            }
            RoundPhase::End => {
                self.round_end_timer = 0.0;
                self.time_freeze_timer = 0.0;
                self.float_back.cancel();
                for die in &mut self.dice {
                    die.reset();
                }
                if let Some(ending) = self.ending {
                    self.presenter.show_end(ending);
                }
            }
        }
    }

    fn throw_dice(&mut self) {
        self.abilities = AbilityUses {
            sticky: self.config.sticky_uses_per_round,
            repulsion: self.config.repulsion_uses_per_round,
        };
        self.float_back.cancel();
        self.round_end_timer = 0.0;

        // A reroll keeps the last bet, but never more than the gold held
        if self.account.current_wager > self.account.gold {
            self.account.current_wager = self.account.gold;
        }

        for die in &mut self.dice {
            die.reset_repulsion();
            die.roll();
        }
    }

    fn resolve_round(&mut self) {
        let dice = DicePair::new(self.dice[0].top_face(), self.dice[1].top_face());
        let total = dice.total();
        let bet = self.account.current_bet;
        let wager = self.account.current_wager;
        let gold_before_round = self.account.gold;
        let did_win = bet.wins_on(total);

        if bet == BetType::NoBet {
            log::warn!("No bet was placed this round");
        }
        let delta = self.account.settle(did_win);
        log::info!(
            "Round {} over: {} + {} = {}, {:?} {} ({:+} gold)",
            self.rounds_played + 1,
            dice.die1,
            dice.die2,
            total,
            bet,
            if did_win { "won" } else { "lost" },
            delta
        );

        self.presenter.show_outcome(total, bet, did_win);
        self.presenter.show_gold(self.account.gold);
        if did_win {
            self.presenter.show_wins(self.account.wins_count);
        }

        let outcome = RoundOutcome {
            bet_type: bet,
            wager_amount: wager,
            gold_before_round,
            did_win,
            die1: dice.die1,
            die2: dice.die2,
        };
        self.rounds_played += 1;
        self.last_outcome = Some(outcome);

        let caught = if gold_before_round > 0 {
            let assessment = self.suspicion.assess_round(&outcome);
            if assessment.level_changed() {
                self.presenter.show_suspicion_level(assessment.level);
            }
            let caught = assessment.caught;
            self.last_assessment = Some(assessment);
            caught
        } else {
            log::error!("Skipping suspicion check with {} gold", gold_before_round);
            false
        };

        if let Some(ending) = self.end_condition(caught) {
            self.ending = Some(ending);
            self.fire(Trigger::EndConditionMet);
        }
    }

    fn end_condition(&self, caught: bool) -> Option<Ending> {
        if caught || self.suspicion.is_caught() {
            Some(Ending::CaughtCheating)
        } else if self.account.gold <= 0 {
            Some(Ending::Bankrupt)
        } else if !self.config.endless && self.account.gold >= self.config.goal_gold() {
            Some(Ending::GoalReached)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::testing::{DieCalls, ScriptedDie, RecordingPresenter, Shown};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Rig {
        machine: RoundStateMachine,
        calls: [Rc<RefCell<DieCalls>>; 2],
        shown: Rc<RefCell<Vec<Shown>>>,
    }

    /// Machine whose dice land on the given pairs, one pair per throw
    fn rig(config: RoundConfig, rolls: &[(u8, u8)]) -> Rig {
        let (die1, calls1) = ScriptedDie::new(rolls.iter().map(|r| r.0));
        let (die2, calls2) = ScriptedDie::new(rolls.iter().map(|r| r.1));
        let (presenter, shown) = RecordingPresenter::new();
        let dice: Vec<Box<dyn Die>> = vec![Box::new(die1), Box::new(die2)];
        let machine = RoundStateMachine::new(config, dice, Box::new(presenter)).expect("wired");
        Rig {
            machine,
            calls: [calls1, calls2],
            shown,
        }
    }

    /// Tick until the dice settle and Results is entered
    fn settle(machine: &mut RoundStateMachine) {
        for _ in 0..100 {
            machine.step_dice(SIM_DT);
            if machine.poll_dice() {
                return;
            }
        }
        panic!("dice never settled");
    }

    fn play(machine: &mut RoundStateMachine, bet: BetType, wager: i64) {
        machine.place_bet(bet, wager).expect("bet accepted");
        assert!(machine.begin_round());
        settle(machine);
    }

    /// Run out the Results countdown back to Ready
    fn finish(machine: &mut RoundStateMachine) {
        let mut guard = 0;
        while machine.phase() == RoundPhase::Results {
            machine.advance_timers(0.5);
            guard += 1;
            assert!(guard < 1000);
        }
    }

    #[test]
    fn test_transition_table() {
        use RoundPhase::*;
        use Trigger::*;

        assert_eq!(next_phase(Ready, BeginRound), Some(Rolling));
        assert_eq!(next_phase(Results, BeginRound), Some(Rolling));
        assert_eq!(next_phase(Rolling, BeginRound), None);
        assert_eq!(next_phase(TimeFreeze, BeginRound), None);
        assert_eq!(next_phase(Rolling, Freeze), Some(TimeFreeze));
        assert_eq!(next_phase(Results, Freeze), None);
        assert_eq!(next_phase(TimeFreeze, Unfreeze), Some(Rolling));
        assert_eq!(next_phase(TimeFreeze, FreezeExpired), Some(Rolling));
        assert_eq!(next_phase(Rolling, EndConditionMet), None);
        assert_eq!(next_phase(Results, EndConditionMet), Some(End));
        for trigger in [
            BeginRound,
            DiceStopped,
            Freeze,
            FreezeExpired,
            Unfreeze,
            CountdownElapsed,
            EndConditionMet,
        ] {
            assert_eq!(next_phase(End, trigger), None);
        }
    }

    #[test]
    fn test_missing_die_is_setup_error() {
        let (die, _) = ScriptedDie::new([1]);
        let (presenter, shown) = RecordingPresenter::new();
        let dice: Vec<Box<dyn Die>> = vec![Box::new(die)];
        let result = RoundStateMachine::new(RoundConfig::default(), dice, Box::new(presenter));
        assert!(matches!(result, Err(SetupError::DiceCount { expected: 2, got: 1 })));
        assert!(shown.borrow().is_empty());
    }

    #[test]
    fn test_bad_config_is_setup_error() {
        let config = RoundConfig {
            round_end_time: -1.0,
            ..Default::default()
        };
        let (d1, _) = ScriptedDie::new([1]);
        let (d2, _) = ScriptedDie::new([1]);
        let (presenter, _) = RecordingPresenter::new();
        let dice: Vec<Box<dyn Die>> = vec![Box::new(d1), Box::new(d2)];
        let result = RoundStateMachine::new(config, dice, Box::new(presenter));
        assert!(matches!(result, Err(SetupError::Config(_))));
    }

    #[test]
    fn test_round_lifecycle() {
        let mut rig = rig(RoundConfig::default(), &[(5, 6), (1, 2)]);
        let machine = &mut rig.machine;
        assert_eq!(machine.phase(), RoundPhase::Ready);

        play(machine, BetType::Over7, 100);
        assert_eq!(machine.phase(), RoundPhase::Results);
        assert_eq!(machine.account().gold, 1100);
        assert_eq!(machine.account().wins_count, 1);
        assert_eq!(machine.round_end_timer(), machine.config().round_end_time);
        assert_eq!(machine.rounds_played(), 1);
        assert!(rig.shown.borrow().contains(&Shown::Outcome(11, BetType::Over7, true)));

        finish(machine);
        assert_eq!(machine.phase(), RoundPhase::Ready);
        assert_eq!(machine.account().current_bet, BetType::NoBet);
        assert_eq!(machine.account().current_wager, 0);

        play(machine, BetType::Over7, 100);
        assert_eq!(machine.account().gold, 1000);
        assert_eq!(rig.calls[0].borrow().rolls, 2);
        assert_eq!(rig.calls[1].borrow().repulsion_resets, 2);
    }

    #[test]
    fn test_invalid_requests_are_noops() {
        let mut rig = rig(RoundConfig::default(), &[(2, 2)]);
        let machine = &mut rig.machine;

        assert!(!machine.end_time_freeze());
        assert!(!machine.start_time_freeze(1.0));
        assert!(machine.begin_round());
        assert!(!machine.begin_round());
        assert_eq!(rig.calls[0].borrow().rolls, 1);
        assert_eq!(
            machine.place_bet(BetType::Over7, 10),
            Err(BetError::WrongPhase(RoundPhase::Rolling))
        );
        assert_eq!(machine.phase(), RoundPhase::Rolling);
    }

    #[test]
    fn test_reroll_from_results_keeps_bet() {
        let mut rig = rig(RoundConfig::default(), &[(1, 1), (6, 6)]);
        let machine = &mut rig.machine;
        play(machine, BetType::Over7, 600);
        assert_eq!(machine.account().gold, 400);

        assert!(machine.begin_round());
        assert_eq!(machine.phase(), RoundPhase::Rolling);
        assert_eq!(machine.account().current_bet, BetType::Over7);
        assert_eq!(machine.account().current_wager, 400);
        settle(machine);
        assert_eq!(machine.account().gold, 800);
    }

    #[test]
    fn test_float_back_fires_once() {
        let mut rig = rig(RoundConfig::default(), &[(3, 3)]);
        let machine = &mut rig.machine;
        play(machine, BetType::Under7, 10);

        // 10s countdown, float starts at 4s remaining, poll in small ticks
        let mut ticks = 0;
        while machine.phase() == RoundPhase::Results {
            machine.advance_timers(0.05);
            ticks += 1;
        }
        assert!(ticks > 100);
        let duration = machine.config().float_duration();
        for calls in &rig.calls {
            assert_eq!(calls.borrow().return_animations, vec![duration]);
        }
        assert_eq!(machine.phase(), RoundPhase::Ready);
    }

    #[test]
    fn test_float_back_waits_for_threshold() {
        let mut rig = rig(RoundConfig::default(), &[(3, 3)]);
        let machine = &mut rig.machine;
        play(machine, BetType::Under7, 10);

        machine.advance_timers(5.9);
        assert!(rig.calls[0].borrow().return_animations.is_empty());
        assert_eq!(machine.float_back().progress(), None);

        machine.advance_timers(0.2);
        assert_eq!(rig.calls[0].borrow().return_animations.len(), 1);
        machine.advance_timers(1.0);
        let progress = machine.float_back().progress().expect("started");
        assert!((progress - 0.6).abs() < 1e-4, "{}", progress);
        machine.advance_timers(1.0);
        assert_eq!(rig.calls[0].borrow().return_animations.len(), 1);
        assert_eq!(machine.float_back().progress(), Some(1.0));
    }

    #[test]
    fn test_time_freeze_and_abilities() {
        let mut rig = rig(RoundConfig::default(), &[(2, 5)]);
        let machine = &mut rig.machine;
        machine.place_bet(BetType::Exactly7, 100).unwrap();
        assert!(machine.begin_round());

        assert!(!machine.can_use_ability(AbilityKind::StickyAnchor));
        assert_eq!(machine.abilities_remaining(AbilityKind::StickyAnchor), 2);

        assert!(machine.start_time_freeze(60.0));
        assert_eq!(machine.phase(), RoundPhase::TimeFreeze);
        assert_eq!(machine.time_freeze_timer(), machine.config().time_freeze_maximum_duration);
        assert_eq!(rig.calls[0].borrow().freezes, 1);

        // Frozen dice never settle
        for _ in 0..20 {
            machine.step_dice(SIM_DT);
            assert!(!machine.poll_dice());
        }

        assert!(machine.use_ability(AbilityKind::StickyAnchor, 0, 6));
        assert!(machine.notify_ability_used(AbilityKind::StickyAnchor));
        assert!(!machine.notify_ability_used(AbilityKind::StickyAnchor));
        assert_eq!(machine.abilities_remaining(AbilityKind::StickyAnchor), 0);
        assert_eq!(machine.abilities_remaining(AbilityKind::RepulsionNudge), 2);
        assert_eq!(rig.calls[0].borrow().abilities, vec![(AbilityKind::StickyAnchor, 6)]);

        assert!(machine.end_time_freeze());
        assert_eq!(machine.phase(), RoundPhase::Rolling);
        assert_eq!(rig.calls[0].borrow().unfreezes, 1);
        // Resuming does not rethrow or refill uses
        assert_eq!(rig.calls[0].borrow().rolls, 1);
        assert_eq!(machine.abilities_remaining(AbilityKind::StickyAnchor), 0);
        assert!(!machine.can_use_ability(AbilityKind::RepulsionNudge));
    }

    #[test]
    fn test_time_freeze_expires() {
        let mut rig = rig(RoundConfig::default(), &[(2, 5)]);
        let machine = &mut rig.machine;
        machine.begin_round();
        assert!(machine.start_time_freeze(1.0));
        machine.advance_timers(0.6);
        assert_eq!(machine.phase(), RoundPhase::TimeFreeze);
        machine.advance_timers(0.6);
        assert_eq!(machine.phase(), RoundPhase::Rolling);
        assert_eq!(rig.calls[1].borrow().unfreezes, 1);
        assert!(!machine.start_time_freeze(0.0));
    }

    #[test]
    fn test_uses_refill_each_throw() {
        let mut rig = rig(RoundConfig::default(), &[(1, 2), (3, 4)]);
        let machine = &mut rig.machine;
        machine.begin_round();
        machine.start_time_freeze(1.0);
        machine.notify_ability_used(AbilityKind::RepulsionNudge);
        machine.end_time_freeze();
        settle(machine);
        assert_eq!(machine.abilities_remaining(AbilityKind::RepulsionNudge), 1);
        machine.begin_round();
        assert_eq!(machine.abilities_remaining(AbilityKind::RepulsionNudge), 2);
    }

    #[test]
    fn test_bankrupt_ends_session() {
        let mut rig = rig(RoundConfig::default(), &[(1, 1), (6, 6)]);
        let machine = &mut rig.machine;
        play(machine, BetType::Over7, 1000);
        assert_eq!(machine.account().gold, 0);
        assert_eq!(machine.phase(), RoundPhase::End);
        assert_eq!(machine.ending(), Some(Ending::Bankrupt));
        assert_eq!(machine.round_end_timer(), 0.0);
        assert!(rig.shown.borrow().contains(&Shown::End(Ending::Bankrupt)));
        assert_eq!(rig.calls[0].borrow().resets, 1);

        // Terminal
        assert!(!machine.begin_round());
        machine.advance_timers(100.0);
        assert_eq!(machine.phase(), RoundPhase::End);
    }

    #[test]
    fn test_goal_reached_unless_endless() {
        let config = RoundConfig {
            starting_gold: 100,
            goal_multiplier: 3,
            ..Default::default()
        };
        let mut rig = rig(config.clone(), &[(3, 4)]);
        play(&mut rig.machine, BetType::Exactly7, 100);
        assert_eq!(rig.machine.account().gold, 500);
        assert_eq!(rig.machine.ending(), Some(Ending::GoalReached));

        let endless = RoundConfig { endless: true, ..config };
        let mut rig = self::rig(endless, &[(3, 4)]);
        play(&mut rig.machine, BetType::Exactly7, 100);
        assert_eq!(rig.machine.phase(), RoundPhase::Results);
        assert_eq!(rig.machine.ending(), None);
    }

    #[test]
    fn test_endless_still_goes_bankrupt() {
        let config = RoundConfig {
            endless: true,
            ..Default::default()
        };
        let mut rig = rig(config, &[(1, 1)]);
        play(&mut rig.machine, BetType::Over7, 1000);
        assert_eq!(rig.machine.ending(), Some(Ending::Bankrupt));
    }

    #[test]
    fn test_caught_cheating_ends_session() {
        // Three all-in wins (+2), then repeat rolls (+1 each)
        let rolls = [(6, 6), (5, 6), (6, 5), (6, 5), (5, 6)];
        let mut rig = rig(RoundConfig { endless: true, ..Default::default() }, &rolls);
        let machine = &mut rig.machine;
        let bets = [BetType::Over7, BetType::Over7, BetType::Over7, BetType::Under7, BetType::Under7];
        for (i, bet) in bets.iter().enumerate() {
            let gold = machine.account().gold;
            let wager = if i < 3 { gold } else { 10 };
            play(machine, *bet, wager);
            if machine.phase() == RoundPhase::End {
                break;
            }
            finish(machine);
        }
        // Level: +2 (all-in streak, round 3) +1 (repeat round 3) +1 (repeat round 4) +1 (repeat round 5)
        assert_eq!(machine.suspicion_level(), SuspicionLevel::CaughtCheating);
        assert_eq!(machine.ending(), Some(Ending::CaughtCheating));
        assert_eq!(machine.phase(), RoundPhase::End);
        assert!(rig.shown.borrow().contains(&Shown::End(Ending::CaughtCheating)));
        assert!(rig.shown.borrow().contains(&Shown::Suspicion(SuspicionLevel::CaughtCheating)));
    }

    #[test]
    fn test_outcome_carries_pre_round_gold() {
        let mut rig = rig(RoundConfig::default(), &[(6, 6), (1, 1)]);
        let machine = &mut rig.machine;
        play(machine, BetType::Over7, 500);
        let outcome = *machine.last_outcome().expect("resolved");
        assert_eq!(outcome.gold_before_round, 1000);
        assert_eq!(outcome.wager_fraction(), 0.5);
        assert_eq!(machine.account().gold, 1500);
        finish(machine);

        // 750 of 1500 is a half-gold loss
        play(machine, BetType::Over7, 750);
        let assessment = machine.last_assessment().expect("assessed");
        assert_eq!(machine.last_outcome().map(|o| o.gold_before_round), Some(1500));
        assert_eq!(assessment.triggers, vec![crate::sim::SuspicionTrigger::LossHalf]);
    }

    #[test]
    fn test_summary_serializes() {
        let rig = rig(RoundConfig::default(), &[(1, 2)]);
        let summary = rig.machine.summary();
        let json = serde_json::to_string(&summary).expect("serializable");
        assert!(json.contains("\"phase\":\"Ready\""));
        assert_eq!(summary.gold, 1000);
    }
}
