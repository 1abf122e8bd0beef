//! Minimal circle rigid body
//!
//! Just enough integration for a standalone match: impulses, linear damping
//! and position. Contacts are resolved in `collision`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A circular body in the arena plane (no gravity, no rotation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub mass: f32,
    /// Linear damping coefficient (1/s)
    pub damping: f32,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            mass: 1.0,
            damping: 0.0,
            radius,
        }
    }

    /// Inverse mass, zero for a massless (immovable) body
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }

    /// Instant change in momentum
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.mass <= 0.0 {
            log::warn!("Impulse {:?} skipped on massless body", impulse);
            return;
        }
        self.vel += impulse / self.mass;
    }

    /// Advance one step: damp velocity, then move
    pub fn integrate(&mut self, dt: f32) {
        self.vel *= 1.0 / (1.0 + dt * self.damping);
        self.pos += self.vel * dt;
    }

    /// Place the body at rest
    pub fn teleport(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
    }
}
