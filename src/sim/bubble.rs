//! Per-player bubble state
//!
//! Size is the one free variable: mass, damping and collider radius are
//! always derived from it and pushed into the body by [`Bubble::sync_body`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::effects::EffectQueue;
use crate::consts::BUBBLE_BASE_RADIUS;
use crate::tuning::BubbleTuning;
use crate::{inverse_lerp, lerp};

/// Stable handle for a registered bubble
pub type ActorId = u32;

/// Where a bubble is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LifePhase {
    /// On the field
    Alive,
    /// Popped, waiting to respawn
    Dead { respawn_in: f32 },
    /// Out of lives
    Eliminated,
}

impl LifePhase {
    /// Whether the bubble is simulated this tick
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }

    /// Whether the bubble still counts toward the win check
    pub fn is_in_match(&self) -> bool {
        !matches!(self, Self::Eliminated)
    }
}

/// Values that item effects are allowed to change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Charge gained per second while holding
    pub charge_rate: f32,
    /// Shielded bubbles cannot be popped or bounced
    pub shielded: bool,
}

/// One player's bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: ActorId,
    /// Join slot (0-based player index)
    pub slot: usize,
    pub body: Body,
    pub phase: LifePhase,
    /// Registered spawn point
    pub spawn_point: Vec2,
    /// Seconds until input is accepted again
    pub controls_locked: f32,
    pub modifiers: Modifiers,
    pub effects: EffectQueue,
    pub(crate) size: f32,
    pub(crate) charge: f32,
    pub(crate) charging: bool,
    pub(crate) move_dir: Vec2,
    pub(crate) last_valid_dir: Vec2,
    pub(crate) alpha: f32,
    lives: u8,
    pub(crate) tuning: BubbleTuning,
}

impl Bubble {
    pub fn new(id: ActorId, slot: usize, spawn_point: Vec2, tuning: &BubbleTuning, lives: u8) -> Self {
        let mut bubble = Self {
            id,
            slot,
            body: Body::new(spawn_point, BUBBLE_BASE_RADIUS),
            phase: LifePhase::Alive,
            spawn_point,
            controls_locked: 0.0,
            modifiers: Modifiers {
                charge_rate: tuning.charge_rate,
                shielded: false,
            },
            effects: EffectQueue::new(),
            size: tuning.initial_size,
            charge: 0.0,
            charging: false,
            move_dir: Vec2::ZERO,
            last_valid_dir: Vec2::X,
            alpha: 1.0,
            lives,
            tuning: *tuning,
        };
        bubble.set_size(tuning.initial_size);
        bubble
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn charge_level(&self) -> f32 {
        self.charge
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn is_shielded(&self) -> bool {
        self.modifiers.shielded
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Sprite alpha: dims while charging small, back to 1.0 when idle
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn tuning(&self) -> &BubbleTuning {
        &self.tuning
    }

    /// Direction of the last non-zero move input
    pub fn last_valid_direction(&self) -> Vec2 {
        self.last_valid_dir
    }

    /// Current raw move input
    pub fn move_direction(&self) -> Vec2 {
        self.move_dir
    }

    /// Size mapped onto [0, 1] across [min_size, max_size]
    pub fn normalized_size(&self) -> f32 {
        inverse_lerp(self.tuning.min_size, self.tuning.max_size, self.size)
    }

    pub fn mass(&self) -> f32 {
        self.tuning.base_weight * self.size
    }

    /// Small bubbles are draggy, large ones glide
    pub fn damping_multiplier(&self) -> f32 {
        lerp(1.5, 0.5, self.normalized_size())
    }

    pub fn linear_damping(&self) -> f32 {
        self.tuning.base_damping * self.damping_multiplier()
    }

    pub fn radius(&self) -> f32 {
        BUBBLE_BASE_RADIUS * self.size
    }

    /// Record a move input; non-zero input also becomes the fallback burst direction
    pub fn set_move_input(&mut self, dir: Vec2) {
        self.move_dir = dir;
        let unit = dir.normalize_or_zero();
        if unit != Vec2::ZERO {
            self.last_valid_dir = unit;
        }
    }

    /// Clamp and store a new size, then refresh the derived body values
    pub(crate) fn set_size(&mut self, size: f32) {
        // max/min rather than clamp: a hand-built tuning may have min > max
        self.size = size.max(self.tuning.min_size).min(self.tuning.max_size);
        self.sync_body();
    }

    /// Push mass, damping and radius into the body
    pub fn sync_body(&mut self) {
        self.body.mass = self.mass();
        self.body.damping = self.linear_damping();
        self.body.radius = self.radius();
    }

    /// Back to spawn defaults: no charge, initial size, opaque
    pub fn reset_charge_state(&mut self) {
        self.charge = 0.0;
        self.charging = false;
        self.move_dir = Vec2::ZERO;
        self.alpha = 1.0;
        self.set_size(self.tuning.initial_size);
    }

    /// Take one life, returning what is left
    pub(crate) fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble() -> Bubble {
        Bubble::new(1, 0, Vec2::new(2.0, 1.0), &BubbleTuning::default(), 3)
    }

    #[test]
    fn test_spawn_defaults() {
        let b = bubble();
        assert_eq!(b.size(), 1.0);
        assert_eq!(b.charge_level(), 0.0);
        assert_eq!(b.lives(), 3);
        assert_eq!(b.last_valid_direction(), Vec2::X);
        assert_eq!(b.body.pos, Vec2::new(2.0, 1.0));
        assert_eq!(b.body.mass, 1.0);
        assert!(b.phase.is_alive());
    }

    #[test]
    fn test_inverted_size_range_does_not_panic() {
        let tuning = BubbleTuning {
            min_size: 3.0,
            max_size: 2.0,
            ..Default::default()
        };
        let mut b = Bubble::new(1, 0, Vec2::ZERO, &tuning, 3);
        assert_eq!(b.size(), 2.0);
        b.set_size(0.1);
        assert_eq!(b.size(), 2.0);
    }

    #[test]
    fn test_derived_values_follow_size() {
        let mut b = bubble();
        b.set_size(5.0);
        assert_eq!(b.mass(), 5.0);
        assert_eq!(b.body.mass, 5.0);
        assert!((b.damping_multiplier() - 0.5).abs() < 1e-6);
        assert!((b.body.damping - 2.5).abs() < 1e-6);
        assert!((b.body.radius - 2.5).abs() < 1e-6);

        b.set_size(0.5);
        assert!((b.damping_multiplier() - 1.5).abs() < 1e-6);
        assert!((b.body.damping - 7.5).abs() < 1e-6);
    }

    #[test]
    fn test_size_is_clamped() {
        let mut b = bubble();
        b.set_size(100.0);
        assert_eq!(b.size(), 5.0);
        b.set_size(-1.0);
        assert_eq!(b.size(), 0.5);
    }

    #[test]
    fn test_zero_move_keeps_last_direction() {
        let mut b = bubble();
        b.set_move_input(Vec2::new(0.0, 2.0));
        assert_eq!(b.last_valid_direction(), Vec2::Y);
        b.set_move_input(Vec2::ZERO);
        assert_eq!(b.last_valid_direction(), Vec2::Y);
        assert_eq!(b.move_direction(), Vec2::ZERO);
    }

    #[test]
    fn test_lives_saturate() {
        let mut b = Bubble::new(1, 0, Vec2::ZERO, &BubbleTuning::default(), 1);
        assert_eq!(b.lose_life(), 0);
        assert_eq!(b.lose_life(), 0);
    }

    #[test]
    fn test_life_phase_queries() {
        assert!(LifePhase::Dead { respawn_in: 1.0 }.is_in_match());
        assert!(!LifePhase::Dead { respawn_in: 1.0 }.is_alive());
        assert!(!LifePhase::Eliminated.is_in_match());
    }
}
