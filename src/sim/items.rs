//! Item spawn points and pickups on the field
//!
//! Every spawn point holds at most one pickup. A point without a pickup runs
//! a spawn cycle: wait `spawn_delay`, then place one. Collecting any pickup
//! restarts the cycle of every idle point.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::{ItemChoice, ItemSpawnPoint};
use super::effects::ItemKind;
use crate::consts::PICKUP_RADIUS;

/// A pickup lying on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: ItemKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Index of the spawn point that placed it
    pub spawner: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Spawner {
    point: ItemSpawnPoint,
    /// Seconds until the running cycle spawns; `None` when no cycle runs
    countdown: Option<f32>,
    /// Pickup currently owned by this point
    current: Option<u32>,
}

impl Spawner {
    fn start_cycle(&mut self, delay: f32) {
        if self.countdown.is_none() && self.current.is_none() {
            self.countdown = Some(delay);
        }
    }
}

/// All item spawn points of a match and the pickups they placed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemField {
    spawners: Vec<Spawner>,
    /// Live pickups (sorted by id)
    pub pickups: Vec<Pickup>,
    spawn_delay: f32,
}

impl ItemField {
    /// Create the field and start every point's first cycle
    pub fn new(points: &[ItemSpawnPoint], spawn_delay: f32) -> Self {
        let mut field = Self {
            spawners: points
                .iter()
                .map(|p| Spawner {
                    point: p.clone(),
                    countdown: None,
                    current: None,
                })
                .collect(),
            pickups: Vec::new(),
            spawn_delay,
        };
        for spawner in &mut field.spawners {
            spawner.start_cycle(spawn_delay);
        }
        field
    }

    /// Advance spawn cycles, returning pickups placed this tick
    pub fn tick(
        &mut self,
        dt: f32,
        rng: &mut impl Rng,
        mut next_id: impl FnMut() -> u32,
    ) -> Vec<Pickup> {
        let mut spawned = Vec::new();
        for (index, spawner) in self.spawners.iter_mut().enumerate() {
            let Some(countdown) = spawner.countdown.as_mut() else {
                continue;
            };
            *countdown -= dt;
            if *countdown > 0.0 {
                continue;
            }
            spawner.countdown = None;
            if spawner.current.is_some() {
                continue;
            }

            let kind = match spawner.point.choice {
                ItemChoice::Fixed(kind) => kind,
                ItemChoice::Random => ItemKind::random(rng),
            };
            let pickup = Pickup {
                id: next_id(),
                kind,
                pos: spawner.point.pos,
                radius: PICKUP_RADIUS,
                spawner: index,
            };
            log::debug!("Spawned {} pickup {} at {:?}", kind.as_str(), pickup.id, pickup.pos);
            spawner.current = Some(pickup.id);
            spawned.push(pickup.clone());
            self.pickups.push(pickup);
        }
        self.pickups.sort_by_key(|p| p.id);
        spawned
    }

    /// Remove a collected pickup and restart idle spawn cycles
    pub fn collect(&mut self, pickup_id: u32) -> Option<Pickup> {
        let index = self.pickups.iter().position(|p| p.id == pickup_id)?;
        let pickup = self.pickups.remove(index);
        if let Some(spawner) = self.spawners.get_mut(pickup.spawner) {
            spawner.current = None;
        }
        for spawner in &mut self.spawners {
            spawner.start_cycle(self.spawn_delay);
        }
        Some(pickup)
    }

    /// Whether a spawn point is counting down to a new pickup
    pub fn is_spawning(&self, spawner: usize) -> bool {
        self.spawners
            .get(spawner)
            .is_some_and(|s| s.countdown.is_some())
    }

    pub fn spawner_count(&self) -> usize {
        self.spawners.len()
    }
}
