//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (join order for bubbles, id order for pickups)
//! - No rendering, audio or platform dependencies

pub mod arena;
pub mod body;
pub mod bubble;
pub mod charge;
pub mod collision;
pub mod effects;
pub mod events;
pub mod items;
pub mod lobby;
pub mod match_state;
pub mod session;
pub mod tick;

pub use arena::{Arena, ItemChoice, ItemSpawnPoint, Spike};
pub use body::Body;
pub use bubble::{ActorId, Bubble, LifePhase, Modifiers};
pub use charge::{BurstEvent, apply_burst, burst_magnitude, charge, release, set_charge_held};
pub use collision::{
    BounceEvent, CollisionResult, PairContact, SpikeContact, bounce_magnitude, circle_circle_collision,
    circles_overlap, resolve_bubble_contact, spike_collision, wall_collision,
};
pub use effects::{EffectEvent, EffectPhase, EffectQueue, ItemEffect, ItemKind};
pub use events::{MatchEvent, ObserverId, Observers};
pub use items::{ItemField, Pickup};
pub use lobby::{Lobby, SlotPrompt};
pub use match_state::{HazardOutcome, MatchPhase, MatchState};
pub use session::{Session, SessionPhase};
pub use tick::{PlayerInput, TickInput, tick};
