//! Charge and burst
//!
//! Holding the charge button stores charge and inflates the bubble. Letting
//! go turns the stored charge into a single impulse in the move direction
//! and shrinks the bubble a little.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::{ActorId, Bubble};
use crate::lerp;
use crate::tuning::BubbleTuning;

/// One burst, produced and consumed within a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstEvent {
    pub actor: ActorId,
    /// Unit vector
    pub direction: Vec2,
    pub magnitude: f32,
}

impl BurstEvent {
    pub fn impulse(&self) -> Vec2 {
        self.direction * self.magnitude
    }
}

/// Burst impulse for a given charge and size
///
/// `bop_force * (1 + charge) * lerp(0.5, 1, normalized_size)`
pub fn burst_magnitude(tuning: &BubbleTuning, charge_level: f32, size: f32) -> f32 {
    let normalized = crate::inverse_lerp(tuning.min_size, tuning.max_size, size);
    let size_multiplier = lerp(0.5, 1.0, normalized);
    tuning.bop_force * (1.0 + charge_level) * size_multiplier
}

/// Grow the charge and the bubble for `dt` seconds of holding
pub fn charge(bubble: &mut Bubble, dt: f32) {
    bubble.charge += bubble.modifiers.charge_rate * dt;
    let grown = bubble.size + bubble.tuning.charge_growth_rate * dt;
    bubble.set_size(grown.min(bubble.tuning.max_size));

    let fill = bubble.size / bubble.tuning.max_size;
    bubble.alpha = lerp(bubble.tuning.charge_transparency, 1.0, fill);

    log::trace!(
        "Bubble {} charging - size {:.2}, charge {:.2}",
        bubble.id,
        bubble.size,
        bubble.charge
    );
}

/// Fire the stored charge, if any
///
/// Direction is the current move input, or the last non-zero one when the
/// stick is centred. Returns `None` with no side effects at zero charge.
pub fn release(bubble: &mut Bubble) -> Option<BurstEvent> {
    if bubble.charge <= 0.0 {
        return None;
    }

    let direction = crate::direction_or(bubble.move_dir, bubble.last_valid_dir);
    let magnitude = burst_magnitude(&bubble.tuning, bubble.charge, bubble.size);

    let shrunk = bubble.size - bubble.tuning.discharge_shrink;
    bubble.set_size(shrunk.max(bubble.tuning.min_size));
    bubble.charge = 0.0;

    log::debug!(
        "Bubble {} burst - direction {:?}, force {:.2}",
        bubble.id,
        direction,
        magnitude
    );

    Some(BurstEvent {
        actor: bubble.id,
        direction,
        magnitude,
    })
}

/// Feed the charge button state; returns a burst on the falling edge
///
/// Press starts charging; release stops it, restores full opacity and fires.
pub fn set_charge_held(bubble: &mut Bubble, held: bool) -> Option<BurstEvent> {
    if held == bubble.charging {
        return None;
    }
    bubble.charging = held;
    if held {
        return None;
    }
    bubble.alpha = 1.0;
    release(bubble)
}

/// Hand the burst to the body as an impulse
pub fn apply_burst(bubble: &mut Bubble, burst: &BurstEvent) {
    bubble.body.apply_impulse(burst.impulse());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bubble() -> Bubble {
        Bubble::new(7, 0, Vec2::ZERO, &BubbleTuning::default(), 3)
    }

    #[test]
    fn test_burst_example_values() {
        // bop 2, charge 3, full size -> 2 * 4 * 1
        let tuning = BubbleTuning::default();
        assert!((burst_magnitude(&tuning, 3.0, 5.0) - 8.0).abs() < 1e-5);
        // min size halves the force
        assert!((burst_magnitude(&tuning, 3.0, 0.5) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_charge_grows_size_and_charge() {
        let mut b = bubble();
        charge(&mut b, 1.0);
        assert!((b.charge_level() - 2.0).abs() < 1e-6);
        assert!((b.size() - 1.5).abs() < 1e-6);
        assert!((b.body.mass - 1.5).abs() < 1e-6);
        // lerp(0.5, 1, 1.5 / 5)
        assert!((b.alpha() - 0.65).abs() < 1e-5);
    }

    #[test]
    fn test_charge_caps_at_max_size() {
        let mut b = bubble();
        for _ in 0..100 {
            charge(&mut b, 0.5);
        }
        assert_eq!(b.size(), 5.0);
        assert!(b.charge_level() > 90.0);
    }

    #[test]
    fn test_release_without_charge_is_noop() {
        let mut b = bubble();
        assert!(release(&mut b).is_none());
        assert_eq!(b.size(), 1.0);
        assert_eq!(b.body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_release_uses_move_then_fallback_direction() {
        let mut b = bubble();
        b.set_move_input(Vec2::new(0.0, -1.0));
        charge(&mut b, 0.5);
        let burst = release(&mut b).unwrap();
        assert!((burst.direction - Vec2::NEG_Y).length() < 1e-6);

        b.set_move_input(Vec2::ZERO);
        charge(&mut b, 0.5);
        let burst = release(&mut b).unwrap();
        assert!((burst.direction - Vec2::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_release_shrinks_and_resets_charge() {
        let mut b = bubble();
        charge(&mut b, 1.0);
        let before = b.size();
        release(&mut b).unwrap();
        assert!((b.size() - (before - 0.1)).abs() < 1e-6);
        assert_eq!(b.charge_level(), 0.0);
    }

    #[test]
    fn test_release_floors_at_min_size() {
        let mut b = bubble();
        b.set_size(0.55);
        b.charge = 1.0;
        release(&mut b).unwrap();
        assert_eq!(b.size(), 0.5);
    }

    #[test]
    fn test_button_edges() {
        let mut b = bubble();
        assert!(set_charge_held(&mut b, true).is_none());
        assert!(b.is_charging());
        charge(&mut b, 0.25);
        assert!(b.alpha() < 1.0);
        // Holding again is not an edge
        assert!(set_charge_held(&mut b, true).is_none());

        let burst = set_charge_held(&mut b, false).unwrap();
        assert!(!b.is_charging());
        assert_eq!(b.alpha(), 1.0);

        apply_burst(&mut b, &burst);
        assert!(b.body.vel.x > 0.0);
    }

    proptest! {
        #[test]
        fn prop_burst_monotonic_in_charge(
            size in 0.5f32..5.0,
            c1 in 0.0f32..50.0,
            delta in 0.001f32..50.0,
        ) {
            let tuning = BubbleTuning::default();
            let low = burst_magnitude(&tuning, c1, size);
            let high = burst_magnitude(&tuning, c1 + delta, size);
            prop_assert!(high > low);
        }

        #[test]
        fn prop_size_stays_in_bounds(
            steps in proptest::collection::vec((any::<bool>(), 0.0f32..0.5), 1..200),
        ) {
            let mut b = bubble();
            for (held, dt) in steps {
                if let Some(burst) = set_charge_held(&mut b, held) {
                    apply_burst(&mut b, &burst);
                }
                if b.is_charging() {
                    charge(&mut b, dt);
                }
                prop_assert!(b.size() >= 0.5 && b.size() <= 5.0);
                prop_assert_eq!(b.body.mass, b.mass());
            }
        }
    }
}
