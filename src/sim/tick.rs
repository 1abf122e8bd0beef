//! Fixed timestep simulation tick
//!
//! Advances a whole match by one step, deterministically. Order within a
//! tick: timers, input, effects, integration, bubble contacts, spikes, items.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::{ActorId, LifePhase};
use super::charge;
use super::collision::{PairContact, SpikeContact, resolve_bubble_contact, spike_collision, wall_collision};
use super::events::MatchEvent;
use super::match_state::MatchState;
use crate::consts::MAX_PLAYERS;

/// One player's controls for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Stick direction; any length, zero when centred
    pub move_dir: Vec2,
    /// Charge button held
    pub charge: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Indexed by player slot
    pub players: [PlayerInput; MAX_PLAYERS],
}

impl TickInput {
    /// Input for a slot; out-of-range slots read as idle
    pub fn player(&self, slot: usize) -> PlayerInput {
        self.players.get(slot).copied().unwrap_or_default()
    }

    pub fn set(&mut self, slot: usize, input: PlayerInput) {
        match self.players.get_mut(slot) {
            Some(player) => *player = input,
            None => log::warn!("Input for slot {} ignored", slot),
        }
    }

    /// Whether any slot is holding charge
    pub fn any_charge(&self) -> bool {
        self.players.iter().any(|p| p.charge)
    }
}

/// Advance the match by one fixed timestep
pub fn tick(state: &mut MatchState, input: &TickInput, dt: f32) {
    if state.is_finished() {
        return;
    }
    state.time_ticks += 1;

    update_timers(state, dt);
    apply_input(state, input, dt);
    update_effects(state, dt);
    integrate(state, dt);
    resolve_bubble_pairs(state);
    resolve_spikes(state);
    state.update_items(dt);
}

/// Respawn countdowns and control locks
fn update_timers(state: &mut MatchState, dt: f32) {
    let mut respawns = Vec::new();
    let mut unlocked = Vec::new();

    for bubble in &mut state.bubbles {
        match &mut bubble.phase {
            LifePhase::Dead { respawn_in } => {
                *respawn_in -= dt;
                if *respawn_in <= 0.0 {
                    respawns.push(bubble.id);
                }
            }
            LifePhase::Alive if bubble.controls_locked > 0.0 => {
                bubble.controls_locked = (bubble.controls_locked - dt).max(0.0);
                if bubble.controls_locked == 0.0 {
                    unlocked.push(bubble.id);
                }
            }
            _ => {}
        }
    }

    for actor in respawns {
        state.respawn(actor);
    }
    for actor in unlocked {
        state.emit(MatchEvent::ControlsEnabled { actor });
    }
}

fn apply_input(state: &mut MatchState, input: &TickInput, dt: f32) {
    let mut bursts = Vec::new();

    for bubble in state.bubbles.iter_mut().filter(|b| b.phase.is_alive()) {
        if bubble.controls_locked > 0.0 {
            // Locked bubbles drop a held button without firing
            bubble.charging = false;
            bubble.alpha = 1.0;
            continue;
        }

        let player = input.player(bubble.slot);
        bubble.set_move_input(player.move_dir);
        if let Some(burst) = charge::set_charge_held(bubble, player.charge) {
            charge::apply_burst(bubble, &burst);
            bursts.push(burst);
        }
        if bubble.is_charging() {
            charge::charge(bubble, dt);
        }
    }

    for burst in bursts {
        state.emit(MatchEvent::Burst {
            actor: burst.actor,
            direction: burst.direction,
            magnitude: burst.magnitude,
        });
    }
}

fn update_effects(state: &mut MatchState, dt: f32) {
    let mut events = Vec::new();
    for bubble in &mut state.bubbles {
        for event in bubble.effects.tick(dt, &mut bubble.modifiers) {
            events.push(MatchEvent::from_effect(bubble.id, event));
        }
    }
    for event in events {
        state.emit(event);
    }
}

fn integrate(state: &mut MatchState, dt: f32) {
    let half_extents = state.arena.half_extents;
    let bounciness = state.arena.wall_bounciness;
    for bubble in state.bubbles.iter_mut().filter(|b| b.phase.is_alive()) {
        bubble.sync_body();
        bubble.body.integrate(dt);
        wall_collision(&mut bubble.body, half_extents, bounciness);
    }
}

fn pair_key(a: ActorId, b: ActorId) -> (ActorId, ActorId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Every living pair once, in join order
fn resolve_bubble_pairs(state: &mut MatchState) {
    let rules = state.tuning.rules;
    let mut touching = BTreeSet::new();
    let mut bounces = Vec::new();

    for i in 0..state.bubbles.len() {
        let (head, tail) = state.bubbles.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.phase.is_alive() {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.phase.is_alive()) {
            let key = pair_key(a.id, b.id);
            let fresh = !state.contacts.contains(&key);
            let contact = resolve_bubble_contact(a, b, &rules, fresh);
            if contact.is_touching() {
                touching.insert(key);
            }
            if let PairContact::Bounced(bounce) = contact {
                bounces.push(bounce);
            }
        }
    }

    state.contacts = touching;
    for bounce in bounces {
        state.emit(MatchEvent::Bounced {
            a: bounce.a,
            b: bounce.b,
            impulse: bounce.impulse,
        });
    }
}

fn resolve_spikes(state: &mut MatchState) {
    let bounciness = state.arena.wall_bounciness;
    let mut popped = Vec::new();

    for bubble in state.bubbles.iter_mut().filter(|b| b.phase.is_alive()) {
        for spike in &state.arena.spikes {
            if spike_collision(&mut bubble.body, spike, bounciness) == SpikeContact::Pop {
                popped.push(bubble.id);
                break;
            }
        }
    }

    for actor in popped {
        state.hazard_hit(actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::effects::ItemKind;
    use crate::tuning::Tuning;

    fn started_match(players: usize, seed: u64) -> (MatchState, Vec<ActorId>) {
        let mut tuning = Tuning::default();
        tuning.rules.control_delay = 0.0;
        let mut state = MatchState::new(tuning, seed);
        let ids = (0..players).map(|slot| state.register(slot).unwrap()).collect();
        state.drain_events();
        (state, ids)
    }

    fn hold(slot: usize, dir: Vec2) -> TickInput {
        let mut input = TickInput::default();
        input.set(
            slot,
            PlayerInput {
                move_dir: dir,
                charge: true,
            },
        );
        input
    }

    #[test]
    fn test_hold_then_release_bursts() {
        let (mut state, ids) = started_match(2, 1);
        let input = hold(0, Vec2::X);
        for _ in 0..30 {
            tick(&mut state, &input, SIM_DT);
        }
        let b = state.bubble(ids[0]).unwrap();
        assert!(b.is_charging());
        assert!(b.charge_level() > 0.9);
        assert!(b.size() > 1.2);

        tick(&mut state, &TickInput::default(), SIM_DT);
        let b = state.bubble(ids[0]).unwrap();
        assert_eq!(b.charge_level(), 0.0);
        assert!(b.body.vel.x > 0.0);
        assert_eq!(b.alpha(), 1.0);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, MatchEvent::Burst { actor, .. } if *actor == ids[0]))
        );
    }

    #[test]
    fn test_locked_controls_ignore_input() {
        let mut state = MatchState::new(Tuning::default(), 3);
        let id = state.register(0).unwrap();
        let input = hold(0, Vec2::Y);

        tick(&mut state, &input, SIM_DT);
        assert!(!state.bubble(id).unwrap().is_charging());

        // One second of control delay
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT);
        }
        assert!(
            state
                .drain_events()
                .contains(&MatchEvent::ControlsEnabled { actor: id })
        );
        tick(&mut state, &input, SIM_DT);
        assert!(state.bubble(id).unwrap().is_charging());
    }

    #[test]
    fn test_popped_bubble_respawns_after_delay() {
        let (mut state, ids) = started_match(2, 5);
        state.hazard_hit(ids[0]);
        assert!(!state.bubble(ids[0]).unwrap().phase.is_alive());

        // Two seconds of respawn delay
        for _ in 0..121 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let b = state.bubble(ids[0]).unwrap();
        assert!(b.phase.is_alive());
        assert_eq!(b.lives(), 2);
        assert_eq!(b.body.pos, b.spawn_point);
    }

    #[test]
    fn test_spike_pops_bubble() {
        let (mut state, ids) = started_match(2, 9);
        let spike = state.arena.spikes[0].clone();
        {
            let b = state.bubble_mut(ids[0]).unwrap();
            // Just inside the spike's reach on its pointed side
            b.body.pos = spike.pos + spike.direction * (spike.radius + b.radius() - 0.05);
        }

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.bubble(ids[0]).unwrap().lives(), 2);
        assert!(
            state
                .drain_events()
                .contains(&MatchEvent::Popped { actor: ids[0] })
        );
    }

    #[test]
    fn test_shielded_bubble_survives_spike() {
        let (mut state, ids) = started_match(2, 9);
        state.apply_item(ids[0], ItemKind::Shield);
        let spike = state.arena.spikes[0].clone();
        {
            let b = state.bubble_mut(ids[0]).unwrap();
            b.body.pos = spike.pos + spike.direction * (spike.radius + b.radius() - 0.05);
        }

        tick(&mut state, &TickInput::default(), SIM_DT);
        let b = state.bubble(ids[0]).unwrap();
        assert_eq!(b.lives(), 3);
        assert!(b.phase.is_alive());
    }

    #[test]
    fn test_touching_pair_bounces_once() {
        let (mut state, ids) = started_match(2, 11);
        state.bubble_mut(ids[0]).unwrap().body.pos = Vec2::new(0.0, 0.0);
        state.bubble_mut(ids[1]).unwrap().body.pos = Vec2::new(0.8, 0.0);
        state.bubble_mut(ids[0]).unwrap().body.vel = Vec2::new(3.0, 0.0);

        tick(&mut state, &TickInput::default(), SIM_DT);
        tick(&mut state, &TickInput::default(), SIM_DT);
        let bounces = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, MatchEvent::Bounced { .. }))
            .count();
        assert_eq!(bounces, 1);
        assert!(state.bubble(ids[1]).unwrap().body.vel.x > 0.0);
    }

    #[test]
    fn test_bubbles_stay_inside_walls() {
        let (mut state, ids) = started_match(1, 13);
        state.bubble_mut(ids[0]).unwrap().body.vel = Vec2::new(500.0, -300.0);
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let b = state.bubble(ids[0]).unwrap();
        assert!(state.arena.contains(b.body.pos));
    }

    #[test]
    fn test_finished_match_is_frozen() {
        let (mut state, ids) = started_match(2, 17);
        state.remove(ids[1]);
        assert!(state.is_finished());

        let ticks = state.time_ticks;
        tick(&mut state, &hold(0, Vec2::X), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_determinism() {
        // Two matches with the same seed and inputs end up identical
        let run = || {
            let (mut state, _) = started_match(4, 99999);
            for step in 0..600u32 {
                let mut input = TickInput::default();
                for slot in 0..MAX_PLAYERS {
                    let angle = (step as f32 * 0.05) + slot as f32;
                    input.set(
                        slot,
                        PlayerInput {
                            move_dir: Vec2::from_angle(angle),
                            charge: (step / 20 + slot as u32) % 3 != 0,
                        },
                    );
                }
                tick(&mut state, &input, SIM_DT);
            }
            state.to_json().unwrap()
        };

        assert_eq!(run(), run());
    }
}
