//! Match coordinator
//!
//! Owns the roster and every cross-bubble rule: registration, hazard pops,
//! respawns, item pickups and the win check. Passed by `&mut` into `tick`;
//! nothing else holds bubbles.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::bubble::{ActorId, Bubble, LifePhase};
use super::collision::circles_overlap;
use super::effects::ItemKind;
use super::events::{MatchEvent, ObserverId, Observers};
use super::items::ItemField;
use crate::consts::MAX_PLAYERS;
use crate::tuning::Tuning;

/// Match progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Playing,
    /// Win fired; the simulation is frozen
    Finished,
}

/// What a hazard contact did to a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardOutcome {
    /// Unknown, not alive, or the match is over
    Ignored,
    /// Shield absorbed it
    Blocked,
    /// Popped, respawn pending
    LifeLost { lives: u8 },
    Eliminated,
}

/// Complete match state (deterministic, serializable apart from observers)
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub arena: Arena,
    pub phase: MatchPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Registered bubbles in join order
    pub bubbles: Vec<Bubble>,
    pub items: ItemField,
    pub winner: Option<ActorId>,
    /// Pairs touching at the end of the previous tick (lower id first)
    pub(crate) contacts: BTreeSet<(ActorId, ActorId)>,
    #[serde(skip)]
    events: Vec<MatchEvent>,
    #[serde(skip)]
    observers: Observers,
    /// Next entity ID
    pub(crate) next_id: u32,
}

impl MatchState {
    /// Create a match on the standard arena for the tuned preset
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = tuning.validated_or_default();
        let arena = Arena::from_tuning(&tuning.arena);
        Self::with_arena(tuning, arena, seed)
    }

    /// Create a match on a custom arena
    ///
    /// Invalid tuning is logged and replaced by the defaults.
    pub fn with_arena(tuning: Tuning, arena: Arena, seed: u64) -> Self {
        let tuning = tuning.validated_or_default();
        let items = ItemField::new(&arena.item_points, tuning.items.spawn_delay);
        log::info!(
            "Match created (seed {}, {} spikes, {} item points)",
            seed,
            arena.spikes.len(),
            arena.item_points.len()
        );
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            arena,
            phase: MatchPhase::Playing,
            time_ticks: 0,
            bubbles: Vec::new(),
            items,
            winner: None,
            contacts: BTreeSet::new(),
            events: Vec::new(),
            observers: Observers::default(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a player's bubble at the next free spawn point
    ///
    /// Returns `None` (and logs) when the roster is full, the slot is taken
    /// or the match is over.
    pub fn register(&mut self, slot: usize) -> Option<ActorId> {
        if self.phase == MatchPhase::Finished {
            log::warn!("Player {} cannot join a finished match", slot + 1);
            return None;
        }
        if self.bubbles.len() >= MAX_PLAYERS {
            log::warn!("Roster full, player {} not registered", slot + 1);
            return None;
        }
        if self.bubbles.iter().any(|b| b.slot == slot) {
            log::warn!("Player {} is already registered", slot + 1);
            return None;
        }

        let spawn = match self.arena.spawn_points.get(self.bubbles.len()) {
            Some(point) => *point,
            None => {
                log::warn!("No spawn point available for player {}", slot + 1);
                Vec2::ZERO
            }
        };

        let id = self.next_entity_id();
        let mut bubble = Bubble::new(id, slot, spawn, &self.tuning.bubble, self.tuning.rules.lives);
        bubble.controls_locked = self.tuning.rules.control_delay;
        self.bubbles.push(bubble);

        log::info!("Spawned player {} at {:?}", slot + 1, spawn);
        self.emit(MatchEvent::Joined { actor: id, slot });
        Some(id)
    }

    /// Take a bubble out of the match, dropping its effects and observers
    pub fn remove(&mut self, actor: ActorId) -> bool {
        let Some(index) = self.index_of(actor) else {
            log::warn!("Remove: unknown bubble {}", actor);
            return false;
        };
        let mut bubble = self.bubbles.remove(index);
        bubble.effects.clear(&mut bubble.modifiers);
        self.contacts.retain(|&(a, b)| a != actor && b != actor);

        let dropped = self.observers.unsubscribe_owner(actor);
        log::info!("Player {} left ({} observers dropped)", bubble.slot + 1, dropped);
        self.emit(MatchEvent::Left { actor });
        self.check_win();
        true
    }

    fn index_of(&self, actor: ActorId) -> Option<usize> {
        self.bubbles.iter().position(|b| b.id == actor)
    }

    pub fn bubble(&self, actor: ActorId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == actor)
    }

    pub fn bubble_mut(&mut self, actor: ActorId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id == actor)
    }

    pub fn bubble_by_slot(&self, slot: usize) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.slot == slot)
    }

    pub fn registered_count(&self) -> usize {
        self.bubbles.len()
    }

    /// Bubbles out of lives, in join order
    pub fn eliminated(&self) -> Vec<ActorId> {
        self.bubbles
            .iter()
            .filter(|b| b.phase == LifePhase::Eliminated)
            .map(|b| b.id)
            .collect()
    }

    pub fn eliminated_count(&self) -> usize {
        self.bubbles
            .iter()
            .filter(|b| b.phase == LifePhase::Eliminated)
            .count()
    }

    /// Bubbles still in the running (alive or waiting to respawn)
    pub fn remaining_count(&self) -> usize {
        self.bubbles.iter().filter(|b| b.phase.is_in_match()).count()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == MatchPhase::Finished
    }

    pub fn winner(&self) -> Option<ActorId> {
        self.winner
    }

    /// Join slot of the winner
    pub fn winner_slot(&self) -> Option<usize> {
        self.winner.and_then(|id| self.bubble(id)).map(|b| b.slot)
    }

    /// Register an observer, optionally bound to a bubble's lifetime
    pub fn subscribe(&mut self, owner: Option<ActorId>, callback: impl FnMut(&MatchEvent) + 'static) -> ObserverId {
        self.observers.subscribe(owner, callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Queue an event and hand it to observers
    pub(crate) fn emit(&mut self, event: MatchEvent) {
        self.observers.dispatch(&event);
        self.events.push(event);
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// A bubble touched a hazard
    pub fn hazard_hit(&mut self, actor: ActorId) -> HazardOutcome {
        if self.phase == MatchPhase::Finished {
            return HazardOutcome::Ignored;
        }
        let Some(index) = self.index_of(actor) else {
            log::warn!("Hazard hit on unknown bubble {}", actor);
            return HazardOutcome::Ignored;
        };
        let respawn_delay = self.tuning.rules.respawn_delay;
        let bubble = &mut self.bubbles[index];
        if !bubble.phase.is_alive() {
            return HazardOutcome::Ignored;
        }
        if bubble.is_shielded() {
            log::debug!("Bubble {} shielded from hazard", actor);
            self.emit(MatchEvent::ShieldBlocked { actor });
            return HazardOutcome::Blocked;
        }

        let lives = bubble.lose_life();
        let expired = bubble.effects.clear(&mut bubble.modifiers);
        bubble.body.vel = Vec2::ZERO;
        bubble.charging = false;
        bubble.phase = if lives == 0 {
            LifePhase::Eliminated
        } else {
            LifePhase::Dead {
                respawn_in: respawn_delay,
            }
        };
        let slot = bubble.slot;
        self.contacts.retain(|&(a, b)| a != actor && b != actor);

        self.emit(MatchEvent::Popped { actor });
        self.emit(MatchEvent::LivesChanged { actor, lives });
        for event in expired {
            self.emit(MatchEvent::from_effect(actor, event));
        }

        if lives == 0 {
            log::info!("Player {} eliminated", slot + 1);
            self.emit(MatchEvent::Eliminated { actor });
            self.check_win();
            HazardOutcome::Eliminated
        } else {
            log::info!("Player {} popped, {} lives left", slot + 1, lives);
            HazardOutcome::LifeLost { lives }
        }
    }

    /// Put a popped bubble back on its spawn point with default charge and size
    ///
    /// Lives are untouched. Input stays locked for `control_delay`.
    pub fn respawn(&mut self, actor: ActorId) -> bool {
        let control_delay = self.tuning.rules.control_delay;
        let Some(bubble) = self.bubble_mut(actor) else {
            log::warn!("Respawn: unknown bubble {}", actor);
            return false;
        };
        if !matches!(bubble.phase, LifePhase::Dead { .. }) {
            log::debug!("Respawn ignored for bubble {} ({:?})", actor, bubble.phase);
            return false;
        }

        let spawn = bubble.spawn_point;
        bubble.body.teleport(spawn);
        bubble.reset_charge_state();
        bubble.phase = LifePhase::Alive;
        bubble.controls_locked = control_delay;

        self.emit(MatchEvent::Respawned { actor });
        true
    }

    /// Start (or refresh) an item effect on a living bubble
    pub fn apply_item(&mut self, actor: ActorId, kind: ItemKind) -> bool {
        let items = self.tuning.items;
        let Some(bubble) = self.bubble_mut(actor) else {
            log::warn!("Item {} for unknown bubble {}", kind.as_str(), actor);
            return false;
        };
        if !bubble.phase.is_alive() {
            log::warn!("Item {} for bubble {} that is not on the field", kind.as_str(), actor);
            return false;
        }
        let event = bubble.effects.apply(kind, &items, &mut bubble.modifiers);
        self.emit(MatchEvent::from_effect(actor, event));
        true
    }

    /// Run the win check once the roster is set
    ///
    /// The win check otherwise only runs on elimination and removal, so a
    /// match started with a single registrant finishes here.
    pub fn start(&mut self) {
        log::debug!("Match started with {} players", self.bubbles.len());
        self.check_win();
    }

    /// Fire the win once at most one bubble is left in the running
    pub(crate) fn check_win(&mut self) {
        if self.phase == MatchPhase::Finished || self.remaining_count() > 1 {
            return;
        }
        let winner = self.bubbles.iter().find(|b| b.phase.is_in_match());
        let slot = winner.map(|b| b.slot);
        self.winner = winner.map(|b| b.id);
        self.phase = MatchPhase::Finished;

        match slot {
            Some(slot) => log::info!("Player {} wins!", slot + 1),
            None => log::info!("Match over with no winner"),
        }
        self.emit(MatchEvent::Won {
            winner: self.winner,
            slot,
        });
    }

    /// Run item spawn cycles and hand overlapping pickups to living bubbles
    ///
    /// Bubbles are checked in join order, so the earliest joiner wins a tie.
    pub(crate) fn update_items(&mut self, dt: f32) {
        let next_id = &mut self.next_id;
        let spawned = self.items.tick(dt, &mut self.rng, || {
            let id = *next_id;
            *next_id += 1;
            id
        });
        for pickup in spawned {
            self.emit(MatchEvent::ItemSpawned {
                pickup: pickup.id,
                kind: pickup.kind,
                pos: pickup.pos,
            });
        }

        let mut taken: Vec<(ActorId, u32)> = Vec::new();
        for bubble in self.bubbles.iter().filter(|b| b.phase.is_alive()) {
            for pickup in &self.items.pickups {
                if taken.iter().any(|&(_, id)| id == pickup.id) {
                    continue;
                }
                if circles_overlap(bubble.body.pos, bubble.body.radius, pickup.pos, pickup.radius) {
                    taken.push((bubble.id, pickup.id));
                }
            }
        }

        for (actor, pickup_id) in taken {
            let Some(pickup) = self.items.collect(pickup_id) else {
                continue;
            };
            log::debug!("Bubble {} collected {}", actor, pickup.kind.as_str());
            self.emit(MatchEvent::ItemCollected {
                actor,
                kind: pickup.kind,
            });
            self.apply_item(actor, pickup.kind);
        }
    }

    /// Serialize the current state for debugging or replays
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
