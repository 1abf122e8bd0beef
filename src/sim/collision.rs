//! Collision detection and response
//!
//! Bubble/bubble contacts, arena walls, spikes and pickup triggers. Bubble
//! pairs get a plain contact response first (what a physics engine would
//! do), then the gameplay bounce: restitution on the relative speed plus a
//! bonus for the bigger bubble.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Spike;
use super::body::Body;
use super::bubble::{ActorId, Bubble};
use crate::tuning::MatchTuning;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Contact normal, pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// A gameplay bounce between two bubbles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BounceEvent {
    pub a: ActorId,
    pub b: ActorId,
    /// Impulse applied to `b`; `a` received the negation
    pub impulse: Vec2,
}

/// Check overlap between two circles
pub fn circle_circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let reach = a_radius + b_radius;
    if dist >= reach {
        return CollisionResult::miss();
    }

    // Coincident centres: pick a fixed axis so the pair still separates
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    CollisionResult {
        hit: true,
        point: a_pos + normal * a_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Whether two circles overlap (trigger test, no response)
#[inline]
pub fn circles_overlap(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    (b_pos - a_pos).length_squared() < reach * reach
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Gameplay bounce strength
///
/// `|v_rel| * restitution + size_bonus * |size_a - size_b|`. The size term is
/// the larger bubble's advantage: both sides receive the same impulse, and
/// the bigger (heavier) one is moved less by it. A resting pair of unequal
/// bubbles still bounces.
pub fn bounce_magnitude(rel_vel: Vec2, size_a: f32, size_b: f32, rules: &MatchTuning) -> f32 {
    rel_vel.length() * rules.restitution + rules.size_bonus * (size_a - size_b).abs()
}

/// Mass-weighted impulse that stops two bodies approaching along `normal`
fn contact_impulse(a: &Body, b: &Body, normal: Vec2) -> f32 {
    let approach = (a.vel - b.vel).dot(normal);
    let inv_sum = a.inv_mass() + b.inv_mass();
    if approach <= 0.0 || inv_sum <= 0.0 {
        return 0.0;
    }
    approach / inv_sum
}

/// Push overlapping bodies apart in proportion to their inverse mass
fn separate(a: &mut Body, b: &mut Body, normal: Vec2, penetration: f32) {
    let inv_sum = a.inv_mass() + b.inv_mass();
    if inv_sum <= 0.0 {
        return;
    }
    let correction = normal * (penetration / inv_sum);
    a.pos -= correction * a.inv_mass();
    b.pos += correction * b.inv_mass();
}

/// How a pair of bubbles ended the contact check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairContact {
    Apart,
    /// Touching, separated without a gameplay bounce
    Touching,
    Bounced(BounceEvent),
}

impl PairContact {
    pub fn is_touching(&self) -> bool {
        !matches!(self, PairContact::Apart)
    }
}

/// Resolve a touching pair of bubbles
///
/// Always separates them and removes their approach speed. The gameplay
/// bounce is applied only on a fresh contact (`new_contact`) and only when
/// neither bubble is shielded.
pub fn resolve_bubble_contact(
    a: &mut Bubble,
    b: &mut Bubble,
    rules: &MatchTuning,
    new_contact: bool,
) -> PairContact {
    let result = circle_circle_collision(a.body.pos, a.body.radius, b.body.pos, b.body.radius);
    if !result.hit {
        return PairContact::Apart;
    }
    let normal = result.normal;
    let rel_vel = a.body.vel - b.body.vel;

    separate(&mut a.body, &mut b.body, normal, result.penetration);
    let stop = contact_impulse(&a.body, &b.body, normal);
    a.body.apply_impulse(-normal * stop);
    b.body.apply_impulse(normal * stop);

    if !new_contact || a.is_shielded() || b.is_shielded() {
        return PairContact::Touching;
    }

    let magnitude = bounce_magnitude(rel_vel, a.size(), b.size(), rules);
    if magnitude <= 0.0 {
        return PairContact::Touching;
    }
    let impulse = normal * magnitude;
    a.body.apply_impulse(-impulse);
    b.body.apply_impulse(impulse);

    log::debug!(
        "Bounce {} <-> {}: {:.2} (sizes {:.2} / {:.2})",
        a.id,
        b.id,
        magnitude,
        a.size(),
        b.size()
    );

    PairContact::Bounced(BounceEvent {
        a: a.id,
        b: b.id,
        impulse,
    })
}

/// Keep a body inside an axis-aligned box centred on the origin
///
/// Returns true if a wall was hit.
pub fn wall_collision(body: &mut Body, half_extents: Vec2, bounciness: f32) -> bool {
    let mut hit = false;
    let limit = (half_extents - Vec2::splat(body.radius)).max(Vec2::ZERO);

    if body.pos.x > limit.x || body.pos.x < -limit.x {
        body.pos.x = body.pos.x.clamp(-limit.x, limit.x);
        let outward = body.pos.x.signum();
        if body.vel.x * outward > 0.0 {
            body.vel.x = -body.vel.x * bounciness;
        }
        hit = true;
    }
    if body.pos.y > limit.y || body.pos.y < -limit.y {
        body.pos.y = body.pos.y.clamp(-limit.y, limit.y);
        let outward = body.pos.y.signum();
        if body.vel.y * outward > 0.0 {
            body.vel.y = -body.vel.y * bounciness;
        }
        hit = true;
    }
    hit
}

/// Outcome of a body touching a spike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeContact {
    None,
    /// Hit the spike's blunt side
    Glance,
    /// Hit inside the dead zone
    Pop,
}

/// Test a body against a spike and bounce it off
///
/// The spike is solid from every side. Its collider is a circle; the contact
/// direction is measured from the spike centre to the contact point and
/// compared to the spike direction to decide whether the contact pops.
pub fn spike_collision(body: &mut Body, spike: &Spike, bounciness: f32) -> SpikeContact {
    let result = circle_circle_collision(spike.pos, spike.radius, body.pos, body.radius);
    if !result.hit {
        return SpikeContact::None;
    }

    body.pos += result.normal * result.penetration;
    if body.vel.dot(result.normal) < 0.0 {
        body.vel = reflect_velocity(body.vel, result.normal) * bounciness;
    }

    if spike.pops(result.point) {
        SpikeContact::Pop
    } else {
        SpikeContact::Glance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::BubbleTuning;

    fn bubble(id: ActorId, pos: Vec2, size: f32) -> Bubble {
        let mut b = Bubble::new(id, id as usize, pos, &BubbleTuning::default(), 3);
        b.set_size(size);
        b
    }

    #[test]
    fn test_circle_collision_normal_points_a_to_b() {
        let result = circle_circle_collision(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0);
        assert!(result.hit);
        assert!((result.normal - Vec2::X).length() < 1e-6);
        assert!((result.penetration - 0.5).abs() < 1e-6);

        let result = circle_circle_collision(Vec2::ZERO, 1.0, Vec2::new(3.0, 0.0), 1.0);
        assert!(!result.hit);
    }

    #[test]
    fn test_coincident_circles_still_get_a_normal() {
        let result = circle_circle_collision(Vec2::ONE, 0.5, Vec2::ONE, 0.5);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
    }

    #[test]
    fn test_bounce_magnitude_formula() {
        let rules = MatchTuning::default();
        let m = bounce_magnitude(Vec2::new(3.0, 4.0), 2.0, 1.0, &rules);
        assert!((m - (5.0 * 1.2 + 0.5)).abs() < 1e-5);
        // Zero relative velocity still gets the size term
        let m = bounce_magnitude(Vec2::ZERO, 1.0, 3.0, &rules);
        assert!((m - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bounce_is_equal_and_opposite() {
        let rules = MatchTuning::default();
        let mut a = bubble(1, Vec2::ZERO, 1.0);
        let mut b = bubble(2, Vec2::new(0.9, 0.0), 1.0);
        a.body.vel = Vec2::new(2.0, 0.0);

        let PairContact::Bounced(bounce) = resolve_bubble_contact(&mut a, &mut b, &rules, true)
        else {
            panic!("expected a bounce");
        };
        assert!(bounce.impulse.x > 0.0);
        assert!(a.body.vel.x < 0.0, "a bounces back");
        assert!(b.body.vel.x > 0.0, "b is pushed away");
        // Equal masses: momentum is conserved
        assert!((a.body.vel.x + b.body.vel.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_bigger_bubble_moves_less() {
        let rules = MatchTuning::default();
        let mut big = bubble(1, Vec2::ZERO, 3.0);
        let mut small = bubble(2, Vec2::new(1.6, 0.0), 0.5);

        let contact = resolve_bubble_contact(&mut big, &mut small, &rules, true);
        assert!(matches!(contact, PairContact::Bounced(_)));
        assert!(small.body.vel.length() > big.body.vel.length());
        assert!(small.body.vel.x > 0.0);
    }

    #[test]
    fn test_shield_blocks_bounce() {
        let rules = MatchTuning::default();
        let mut a = bubble(1, Vec2::ZERO, 2.0);
        let mut b = bubble(2, Vec2::new(1.0, 0.0), 1.0);
        b.modifiers.shielded = true;

        let result = resolve_bubble_contact(&mut a, &mut b, &rules, true);
        assert_eq!(result, PairContact::Touching);
        assert_eq!(b.body.vel, Vec2::ZERO);
        // Still separated
        assert!((b.body.pos - a.body.pos).length() >= a.radius() + b.radius() - 1e-4);
    }

    #[test]
    fn test_persisting_contact_does_not_rebounce() {
        let rules = MatchTuning::default();
        let mut a = bubble(1, Vec2::ZERO, 2.0);
        let mut b = bubble(2, Vec2::new(1.0, 0.0), 1.0);
        let result = resolve_bubble_contact(&mut a, &mut b, &rules, false);
        assert_eq!(result, PairContact::Touching);

        let mut far = bubble(3, Vec2::new(10.0, 0.0), 1.0);
        assert_eq!(
            resolve_bubble_contact(&mut a, &mut far, &rules, true),
            PairContact::Apart
        );
    }

    #[test]
    fn test_wall_bounce() {
        let mut body = Body::new(Vec2::new(9.9, 0.0), 0.5);
        body.vel = Vec2::new(10.0, 1.0);
        assert!(wall_collision(&mut body, Vec2::new(10.0, 5.0), 0.8));
        assert!((body.pos.x - 9.5).abs() < 1e-6);
        assert!((body.vel.x + 8.0).abs() < 1e-5);
        assert_eq!(body.vel.y, 1.0);

        let mut inside = Body::new(Vec2::ZERO, 0.5);
        assert!(!wall_collision(&mut inside, Vec2::new(10.0, 5.0), 0.8));
    }

    #[test]
    fn test_spike_pops_inside_dead_zone_only() {
        let spike = Spike::new(Vec2::ZERO, 0.4, Vec2::Y, 90.0);

        // Coming from straight above
        let mut above = Body::new(Vec2::new(0.0, 0.8), 0.5);
        assert_eq!(spike_collision(&mut above, &spike, 0.8), SpikeContact::Pop);

        // Coming from below: blunt side
        let mut below = Body::new(Vec2::new(0.0, -0.8), 0.5);
        below.vel = Vec2::new(0.0, 2.0);
        assert_eq!(spike_collision(&mut below, &spike, 0.8), SpikeContact::Glance);
        assert!(below.vel.y < 0.0);

        let mut far = Body::new(Vec2::new(5.0, 5.0), 0.5);
        assert_eq!(spike_collision(&mut far, &spike, 0.8), SpikeContact::None);
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }
}
