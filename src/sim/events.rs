//! Match events and observers
//!
//! Everything a host (renderer, HUD, audio) needs to react to is emitted as
//! a [`MatchEvent`]. Hosts either drain the queued events after each tick or
//! register an observer callback. Observers can be bound to a bubble; they
//! are dropped when that bubble leaves the match.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::ActorId;
use super::effects::{EffectEvent, ItemKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    Joined { actor: ActorId, slot: usize },
    Left { actor: ActorId },
    ControlsEnabled { actor: ActorId },
    Burst { actor: ActorId, direction: Vec2, magnitude: f32 },
    Bounced { a: ActorId, b: ActorId, impulse: Vec2 },
    /// Hazard contact absorbed by a shield
    ShieldBlocked { actor: ActorId },
    LivesChanged { actor: ActorId, lives: u8 },
    Popped { actor: ActorId },
    Respawned { actor: ActorId },
    Eliminated { actor: ActorId },
    ItemSpawned { pickup: u32, kind: ItemKind, pos: Vec2 },
    ItemCollected { actor: ActorId, kind: ItemKind },
    EffectStarted { actor: ActorId, kind: ItemKind },
    EffectFlicker { actor: ActorId, kind: ItemKind, visible: bool },
    EffectExpired { actor: ActorId, kind: ItemKind },
    /// Last bubble standing (`None` if nobody is left)
    Won { winner: Option<ActorId>, slot: Option<usize> },
}

impl MatchEvent {
    /// Tag an effect timer event with the bubble that owns it
    pub fn from_effect(actor: ActorId, event: EffectEvent) -> Self {
        match event {
            EffectEvent::Started { kind } => MatchEvent::EffectStarted { actor, kind },
            EffectEvent::Flicker { kind, visible } => MatchEvent::EffectFlicker { actor, kind, visible },
            EffectEvent::Expired { kind } => MatchEvent::EffectExpired { actor, kind },
        }
    }

    /// The bubble the event is about, if it is about a single one
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            MatchEvent::Joined { actor, .. }
            | MatchEvent::Left { actor }
            | MatchEvent::ControlsEnabled { actor }
            | MatchEvent::Burst { actor, .. }
            | MatchEvent::ShieldBlocked { actor }
            | MatchEvent::LivesChanged { actor, .. }
            | MatchEvent::Popped { actor }
            | MatchEvent::Respawned { actor }
            | MatchEvent::Eliminated { actor }
            | MatchEvent::ItemCollected { actor, .. }
            | MatchEvent::EffectStarted { actor, .. }
            | MatchEvent::EffectFlicker { actor, .. }
            | MatchEvent::EffectExpired { actor, .. } => Some(*actor),
            MatchEvent::Won { winner, .. } => *winner,
            MatchEvent::Bounced { .. } | MatchEvent::ItemSpawned { .. } => None,
        }
    }
}

pub type ObserverId = u32;

type Callback = Box<dyn FnMut(&MatchEvent)>;

struct Observer {
    id: ObserverId,
    /// Bubble this observer is tied to
    owner: Option<ActorId>,
    callback: Callback,
}

/// Explicit observer registration list
///
/// Dispatch order is registration order.
#[derive(Default)]
pub struct Observers {
    entries: Vec<Observer>,
    next_id: ObserverId,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Observers {
    pub fn subscribe(&mut self, owner: Option<ActorId>, callback: impl FnMut(&MatchEvent) + 'static) -> ObserverId {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Observer {
            id,
            owner,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|o| o.id != id);
        self.entries.len() != before
    }

    /// Drop every observer bound to `actor`, returning how many went
    pub fn unsubscribe_owner(&mut self, actor: ActorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|o| o.owner != Some(actor));
        before - self.entries.len()
    }

    pub fn dispatch(&mut self, event: &MatchEvent) {
        for observer in &mut self.entries {
            (observer.callback)(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
