//! Beetle Bubble - local multiplayer arena brawler
//!
//! Core modules:
//! - `sim`: Deterministic simulation (charge/burst, bounces, items, match flow)
//! - `tuning`: Data-driven game balance
//! - `bot`: Scripted players for the headless demo and soak tests
//!
//! Rendering, audio and input-device binding live in the host. The host
//! feeds a [`sim::TickInput`] per fixed step and reads state and
//! [`sim::MatchEvent`]s back out.

pub mod bot;
pub mod sim;
pub mod tuning;

pub use tuning::{ArenaPreset, Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Player slots on the join screen and in a match
    pub const MAX_PLAYERS: usize = 4;

    /// Bubble radius at size 1.0 (world units)
    pub const BUBBLE_BASE_RADIUS: f32 = 0.5;
    /// Pickup trigger radius
    pub const PICKUP_RADIUS: f32 = 0.35;
    /// Spike collider radius
    pub const SPIKE_RADIUS: f32 = 0.4;
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]
///
/// Returns 0 for a degenerate range.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Unit vector of `v`, or `fallback` when `v` has no direction
#[inline]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let dir = v.normalize_or_zero();
    if dir == Vec2::ZERO { fallback } else { dir }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_clamps_t() {
        assert_eq!(lerp(1.5, 0.5, 0.0), 1.5);
        assert_eq!(lerp(1.5, 0.5, 1.0), 0.5);
        assert_eq!(lerp(1.5, 0.5, 2.0), 0.5);
        assert_eq!(lerp(0.5, 1.0, -1.0), 0.5);
    }

    #[test]
    fn test_inverse_lerp_degenerate() {
        assert_eq!(inverse_lerp(1.0, 1.0, 3.0), 0.0);
        assert!((inverse_lerp(0.5, 5.0, 5.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_direction_or_falls_back() {
        assert_eq!(direction_or(Vec2::ZERO, Vec2::X), Vec2::X);
        let d = direction_or(Vec2::new(0.0, -3.0), Vec2::X);
        assert!((d - Vec2::NEG_Y).length() < 1e-6);
    }
}
