//! Scripted players for the headless demo and soak tests
//!
//! Bots are small state machines that:
//! - Wait a personality-dependent pause
//! - Aim at the nearest rival (or somewhere random)
//! - Hold charge for a while and let go

use glam::Vec2;
use rand::Rng;

use crate::sim::{ActorId, MatchState, PlayerInput};

/// Bot personality affects timing and aim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPersonality {
    /// Short pauses, short taps
    Eager,
    /// Waits, then charges up big
    Patient,
    /// Unpredictable timing and sloppy aim
    Chaotic,
}

impl BotPersonality {
    /// Pause range between bursts (min, max) in seconds
    fn pause_range(&self) -> (f32, f32) {
        match self {
            BotPersonality::Eager => (0.1, 0.5),
            BotPersonality::Patient => (1.0, 2.5),
            BotPersonality::Chaotic => (0.0, 3.0),
        }
    }

    /// Charge hold range (min, max) in seconds
    fn hold_range(&self) -> (f32, f32) {
        match self {
            BotPersonality::Eager => (0.2, 0.6),
            BotPersonality::Patient => (1.0, 2.0),
            BotPersonality::Chaotic => (0.1, 2.5),
        }
    }

    /// Aim error in radians
    fn aim_jitter(&self) -> f32 {
        match self {
            BotPersonality::Eager => 0.2,
            BotPersonality::Patient => 0.05,
            BotPersonality::Chaotic => 1.2,
        }
    }

    fn sample(range: (f32, f32), rng: &mut impl Rng) -> f32 {
        let (min, max) = range;
        min + rng.random::<f32>() * (max - min)
    }

    /// Select a random personality
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..3) {
            0 => BotPersonality::Eager,
            1 => BotPersonality::Patient,
            _ => BotPersonality::Chaotic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BotPersonality::Eager => "eager",
            BotPersonality::Patient => "patient",
            BotPersonality::Chaotic => "chaotic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BotAction {
    Waiting { remaining: f32 },
    Charging { remaining: f32, aim: Vec2 },
}

/// A bot driving one player slot
#[derive(Debug)]
pub struct Bot {
    pub slot: usize,
    pub personality: BotPersonality,
    action: BotAction,
}

impl Bot {
    pub fn new(slot: usize, personality: BotPersonality, rng: &mut impl Rng) -> Self {
        let remaining = BotPersonality::sample(personality.pause_range(), rng);
        Self {
            slot,
            personality,
            action: BotAction::Waiting { remaining },
        }
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.action, BotAction::Charging { .. })
    }

    /// Decide this tick's input
    pub fn tick(&mut self, state: &MatchState, dt: f32, rng: &mut impl Rng) -> PlayerInput {
        let Some(me) = state.bubble_by_slot(self.slot) else {
            return PlayerInput::default();
        };
        if !me.phase.is_alive() {
            self.action = BotAction::Waiting { remaining: 0.0 };
            return PlayerInput::default();
        }
        let (my_id, my_pos) = (me.id, me.body.pos);

        match &mut self.action {
            BotAction::Waiting { remaining } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return PlayerInput::default();
                }
                let aim = self.pick_aim(state, my_id, my_pos, rng);
                let hold = BotPersonality::sample(self.personality.hold_range(), rng);
                self.action = BotAction::Charging {
                    remaining: hold,
                    aim,
                };
                PlayerInput {
                    move_dir: aim,
                    charge: true,
                }
            }
            BotAction::Charging { remaining, aim } => {
                *remaining -= dt;
                let aim = *aim;
                if *remaining > 0.0 {
                    return PlayerInput {
                        move_dir: aim,
                        charge: true,
                    };
                }
                let pause = BotPersonality::sample(self.personality.pause_range(), rng);
                log::trace!("Bot {} releasing toward {:?}", self.slot + 1, aim);
                self.action = BotAction::Waiting { remaining: pause };
                PlayerInput {
                    move_dir: aim,
                    charge: false,
                }
            }
        }
    }

    /// Nearest living rival with some jitter, or a random heading
    fn pick_aim(&self, state: &MatchState, me: ActorId, pos: Vec2, rng: &mut impl Rng) -> Vec2 {
        let target = state
            .bubbles
            .iter()
            .filter(|b| b.id != me && b.phase.is_alive())
            .min_by(|a, b| {
                let da = a.body.pos.distance_squared(pos);
                let db = b.body.pos.distance_squared(pos);
                da.total_cmp(&db)
            })
            .map(|b| b.body.pos);

        let base = match target {
            Some(target) => (target - pos).to_angle(),
            None => rng.random_range(-std::f32::consts::PI..std::f32::consts::PI),
        };
        let jitter = self.personality.aim_jitter();
        Vec2::from_angle(base + rng.random_range(-jitter..=jitter))
    }
}

/// One bot per slot with seeded personalities
pub fn spawn_bots(slots: &[usize], rng: &mut impl Rng) -> Vec<Bot> {
    slots
        .iter()
        .map(|&slot| {
            let personality = BotPersonality::random(rng);
            log::debug!("Bot for player {} is {}", slot + 1, personality.as_str());
            Bot::new(slot, personality, rng)
        })
        .collect()
}
