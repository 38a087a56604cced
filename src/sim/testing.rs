//! Test doubles for the round machine's collaborators

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::dice::{Die, DieState};
use super::state::{AbilityKind, BetType, Ending};
use super::suspicion::SuspicionLevel;
use crate::presenter::Presenter;

/// Fixed steps a scripted die tumbles before it stops
const SCRIPTED_SETTLE_STEPS: u32 = 3;

/// Everything the machine asked of a scripted die
#[derive(Debug, Default)]
pub struct DieCalls {
    pub rolls: u32,
    pub resets: u32,
    pub freezes: u32,
    pub unfreezes: u32,
    pub repulsion_resets: u32,
    pub return_animations: Vec<f32>,
    pub abilities: Vec<(AbilityKind, u8)>,
}

/// Die that lands on a scripted face each throw
pub struct ScriptedDie {
    faces: VecDeque<u8>,
    face: u8,
    state: DieState,
    steps_left: u32,
    frozen: bool,
    calls: Rc<RefCell<DieCalls>>,
}

impl ScriptedDie {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> (Self, Rc<RefCell<DieCalls>>) {
        let calls = Rc::new(RefCell::new(DieCalls::default()));
        let die = Self {
            faces: faces.into_iter().collect(),
            face: 1,
            state: DieState::Idle,
            steps_left: 0,
            frozen: false,
            calls: Rc::clone(&calls),
        };
        (die, calls)
    }
}

impl Die for ScriptedDie {
    fn roll(&mut self) {
        self.calls.borrow_mut().rolls += 1;
        if let Some(face) = self.faces.pop_front() {
            self.face = face;
        }
        self.state = DieState::Rolling;
        self.steps_left = SCRIPTED_SETTLE_STEPS;
    }

    fn reset(&mut self) {
        self.calls.borrow_mut().resets += 1;
        self.state = DieState::Idle;
    }

    fn state(&self) -> DieState {
        self.state
    }

    fn top_face(&self) -> u8 {
        self.face
    }

    fn start_return_animation(&mut self, duration: f32) {
        self.calls.borrow_mut().return_animations.push(duration);
    }

    fn freeze(&mut self) {
        self.calls.borrow_mut().freezes += 1;
        self.frozen = true;
    }

    fn unfreeze(&mut self) {
        self.calls.borrow_mut().unfreezes += 1;
        self.frozen = false;
    }

    fn reset_repulsion(&mut self) {
        self.calls.borrow_mut().repulsion_resets += 1;
    }

    fn apply_ability(&mut self, ability: AbilityKind, face: u8) {
        self.calls.borrow_mut().abilities.push((ability, face));
    }

    fn step(&mut self, _dt: f32) {
        if self.state != DieState::Rolling || self.frozen {
            return;
        }
        self.steps_left = self.steps_left.saturating_sub(1);
        if self.steps_left == 0 {
            self.state = DieState::Stopped;
        }
    }
}

/// One presenter notification
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Outcome(u8, BetType, bool),
    Suspicion(SuspicionLevel),
    Gold(i64),
    Wins(u32),
    End(Ending),
}

/// Presenter that records what it was told
pub struct RecordingPresenter {
    shown: Rc<RefCell<Vec<Shown>>>,
}

impl RecordingPresenter {
    pub fn new() -> (Self, Rc<RefCell<Vec<Shown>>>) {
        let shown = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                shown: Rc::clone(&shown),
            },
            shown,
        )
    }
}

impl Presenter for RecordingPresenter {
    fn show_outcome(&mut self, total: u8, bet: BetType, did_win: bool) {
        self.shown.borrow_mut().push(Shown::Outcome(total, bet, did_win));
    }

    fn show_suspicion_level(&mut self, level: SuspicionLevel) {
        self.shown.borrow_mut().push(Shown::Suspicion(level));
    }

    fn show_gold(&mut self, gold: i64) {
        self.shown.borrow_mut().push(Shown::Gold(gold));
    }

    fn show_wins(&mut self, wins: u32) {
        self.shown.borrow_mut().push(Shown::Wins(wins));
    }

    fn show_end(&mut self, ending: Ending) {
        self.shown.borrow_mut().push(Shown::End(ending));
    }
}
