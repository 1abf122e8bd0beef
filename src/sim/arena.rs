//! Arena layout: walls, spawn points, spikes and item spawn points

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::ItemKind;
use crate::consts::{MAX_PLAYERS, SPIKE_RADIUS};
use crate::tuning::ArenaTuning;

/// A hazard that pops bubbles hitting its pointed side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spike {
    pub pos: Vec2,
    pub radius: f32,
    /// Unit vector the point faces
    pub direction: Vec2,
    /// Full cone angle (degrees) around `direction` that pops
    pub dead_zone_deg: f32,
}

impl Spike {
    pub fn new(pos: Vec2, radius: f32, direction: Vec2, dead_zone_deg: f32) -> Self {
        Self {
            pos,
            radius,
            direction: crate::direction_or(direction, Vec2::Y),
            dead_zone_deg,
        }
    }

    /// Whether a contact at `point` lands inside the dead zone
    pub fn pops(&self, point: Vec2) -> bool {
        let to_contact = (point - self.pos).normalize_or_zero();
        if to_contact == Vec2::ZERO {
            return true;
        }
        let cos = self.direction.dot(to_contact).clamp(-1.0, 1.0);
        cos.acos().to_degrees() <= self.dead_zone_deg / 2.0
    }
}

/// What an item spawn point produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemChoice {
    Fixed(ItemKind),
    /// Rolled from the match RNG each spawn
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpawnPoint {
    pub pos: Vec2,
    pub choice: ItemChoice,
}

/// Static arena geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Walls sit at ±half_extents
    pub half_extents: Vec2,
    pub wall_bounciness: f32,
    /// Player spawn points in join order
    pub spawn_points: Vec<Vec2>,
    pub spikes: Vec<Spike>,
    pub item_points: Vec<ItemSpawnPoint>,
}

impl Arena {
    /// Empty box with no spawns or hazards
    pub fn empty(half_extents: Vec2, wall_bounciness: f32) -> Self {
        Self {
            half_extents,
            wall_bounciness,
            spawn_points: Vec::new(),
            spikes: Vec::new(),
            item_points: Vec::new(),
        }
    }

    /// Standard layout for the tuned preset
    ///
    /// Four corner spawns, a spike on the top and bottom walls pointing into
    /// the field, a shield point on the left and a power-charge point on the
    /// right.
    pub fn from_tuning(tuning: &ArenaTuning) -> Self {
        let half = tuning.preset.half_extents();
        let mut arena = Self::empty(half, tuning.wall_bounciness);

        let corner = half * 0.6;
        arena.spawn_points = vec![
            Vec2::new(-corner.x, corner.y),
            Vec2::new(corner.x, -corner.y),
            Vec2::new(corner.x, corner.y),
            Vec2::new(-corner.x, -corner.y),
        ];
        debug_assert_eq!(arena.spawn_points.len(), MAX_PLAYERS);

        let dead_zone = tuning.spike_dead_zone_deg;
        arena.spikes = vec![
            Spike::new(Vec2::new(0.0, half.y - SPIKE_RADIUS), SPIKE_RADIUS, Vec2::NEG_Y, dead_zone),
            Spike::new(Vec2::new(0.0, -half.y + SPIKE_RADIUS), SPIKE_RADIUS, Vec2::Y, dead_zone),
        ];

        arena.item_points = vec![
            ItemSpawnPoint {
                pos: Vec2::new(-half.x * 0.5, 0.0),
                choice: ItemChoice::Fixed(ItemKind::Shield),
            },
            ItemSpawnPoint {
                pos: Vec2::new(half.x * 0.5, 0.0),
                choice: ItemChoice::Fixed(ItemKind::PowerCharge),
            },
        ];
        arena
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x.abs() <= self.half_extents.x && point.y.abs() <= self.half_extents.y
    }
}
