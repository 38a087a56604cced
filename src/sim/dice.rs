//! Dice collaborators
//!
//! The round machine only sees the `Die` trait. `SimDie` is a headless
//! stand-in for a physical die: it carries velocities, bleeds them off
//! each fixed step and reports Stopped after resting long enough.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::AbilityKind;
use crate::consts::*;

/// Motion state a die reports to the round machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DieState {
    #[default]
    Idle,
    Rolling,
    Stopped,
}

/// What the round machine may ask of one die
pub trait Die {
    /// Throw the die
    fn roll(&mut self);
    /// Put the die back to Idle without throwing
    fn reset(&mut self);
    fn state(&self) -> DieState;
    /// Face showing up, 1..=6
    fn top_face(&self) -> u8;
    /// Begin floating back to the start position over `duration` seconds
    fn start_return_animation(&mut self, duration: f32);
    /// Snapshot motion and halt
    fn freeze(&mut self);
    /// Resume motion from the snapshot
    fn unfreeze(&mut self);
    /// Clear any repulsion nudge left from the previous round
    fn reset_repulsion(&mut self);
    /// Apply an ability's effect aimed at `face`
    fn apply_ability(&mut self, _ability: AbilityKind, _face: u8) {}
    /// Advance physics by one fixed step
    fn step(&mut self, _dt: f32) {}
}

/// Velocity snapshot taken on freeze
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Return-to-start animation progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnAnimation {
    pub elapsed: f32,
    pub duration: f32,
}

impl ReturnAnimation {
    /// Completion in 0..=1
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

/// Per-step velocity retention while tumbling
const LINEAR_DAMPING: f32 = 0.94;
const ANGULAR_DAMPING: f32 = 0.92;
/// Throw impulse ranges
const ROLL_FORCE: f32 = 10.0;
const TORQUE_FORCE: f32 = 10.0;

/// A headless die with seeded outcomes
#[derive(Debug, Clone)]
pub struct SimDie {
    pub name: String,
    rng: Pcg32,
    state: DieState,
    face: u8,
    velocity: Vec3,
    angular_velocity: Vec3,
    time_since_low_velocity: f32,
    settle_time_threshold: f32,
    /// Present while frozen
    frozen: Option<MotionSnapshot>,
    /// Face forced to land up (sticky anchor)
    pinned_face: Option<u8>,
    /// Face nudged away from landing up (repulsion)
    repelled_face: Option<u8>,
    returning: Option<ReturnAnimation>,
}

impl SimDie {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: Pcg32::seed_from_u64(seed),
            state: DieState::Idle,
            face: 1,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            time_since_low_velocity: 0.0,
            settle_time_threshold: SETTLE_TIME_THRESHOLD,
            frozen: None,
            pinned_face: None,
            repelled_face: None,
            returning: None,
        }
    }

    pub fn with_settle_time(mut self, threshold: f32) -> Self {
        self.settle_time_threshold = threshold;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn return_animation(&self) -> Option<ReturnAnimation> {
        self.returning
    }

    /// Anchor a face so it lands up. Cleared when the die settles.
    pub fn pin_face(&mut self, face: u8) {
        if (1..=DIE_FACES).contains(&face) {
            self.pinned_face = Some(face);
        }
    }

    /// Push a face away so it does not land up
    pub fn repel_face(&mut self, face: u8) {
        if (1..=DIE_FACES).contains(&face) {
            self.repelled_face = Some(face);
        }
    }

    fn random_face(&mut self) -> u8 {
        self.rng.random_range(1..=DIE_FACES)
    }

    fn random_unit(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        )
    }

    fn at_rest(&self) -> bool {
        self.velocity.length() < REST_LINEAR_SPEED
            && self.angular_velocity.length() < REST_ANGULAR_SPEED
    }

    /// Pick the face that ends up on top once motion stops
    fn land(&mut self) {
        if let Some(face) = self.pinned_face.take() {
            self.face = face;
        } else if self.repelled_face == Some(self.face) {
            // Tip onto the neighbouring face
            self.face = self.face % DIE_FACES + 1;
        }
        self.state = DieState::Stopped;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        log::debug!("{} has settled on {}", self.name, self.face);
    }
}

impl Die for SimDie {
    fn roll(&mut self) {
        self.time_since_low_velocity = 0.0;
        self.frozen = None;
        self.returning = None;
        self.state = DieState::Rolling;
        self.face = self.random_face();
        self.velocity = Vec3::Y * ROLL_FORCE + self.random_unit();
        self.angular_velocity = self.random_unit() * TORQUE_FORCE;
    }

    fn reset(&mut self) {
        self.time_since_low_velocity = 0.0;
        self.state = DieState::Idle;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.frozen = None;
    }

    fn state(&self) -> DieState {
        self.state
    }

    fn top_face(&self) -> u8 {
        self.face
    }

    fn start_return_animation(&mut self, duration: f32) {
        self.returning = Some(ReturnAnimation {
            elapsed: 0.0,
            duration,
        });
    }

    fn freeze(&mut self) {
        if self.frozen.is_some() {
            return;
        }
        self.frozen = Some(MotionSnapshot {
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
        });
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    fn unfreeze(&mut self) {
        if let Some(snapshot) = self.frozen.take() {
            self.velocity = snapshot.velocity;
            self.angular_velocity = snapshot.angular_velocity;
        }
    }

    fn reset_repulsion(&mut self) {
        self.repelled_face = None;
    }

    fn apply_ability(&mut self, ability: AbilityKind, face: u8) {
        match ability {
            AbilityKind::StickyAnchor => self.pin_face(face),
            AbilityKind::RepulsionNudge => self.repel_face(face),
        }
    }

    fn step(&mut self, dt: f32) {
        if let Some(anim) = self.returning.as_mut() {
            anim.elapsed += dt;
        }
        if self.state != DieState::Rolling || self.frozen.is_some() {
            return;
        }

        self.velocity *= LINEAR_DAMPING;
        self.angular_velocity *= ANGULAR_DAMPING;

        if self.at_rest() {
            self.time_since_low_velocity += dt;
        } else {
            self.time_since_low_velocity = 0.0;
        }

        if self.time_since_low_velocity >= self.settle_time_threshold {
            self.land();
        }
    }
}
