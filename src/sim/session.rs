//! Session flow: Lobby → Match → Win screen → Lobby
//!
//! The session outlives individual matches and keeps the last winner's slot
//! so the win screen can read it after the match is dropped.

use super::events::MatchEvent;
use super::lobby::Lobby;
use super::match_state::MatchState;
use super::tick::{TickInput, tick};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    Lobby,
    Playing,
    /// Showing the winner; back to the lobby when `remaining` runs out
    WinScreen { remaining: f32 },
}

#[derive(Debug)]
pub struct Session {
    pub tuning: Tuning,
    seed: u64,
    matches_played: u64,
    phase: SessionPhase,
    pub lobby: Lobby,
    current: Option<MatchState>,
    last_winner: Option<usize>,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = tuning.validated_or_default();
        Self {
            lobby: Lobby::new(tuning.session),
            tuning,
            seed,
            matches_played: 0,
            phase: SessionPhase::Lobby,
            current: None,
            last_winner: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_match(&self) -> Option<&MatchState> {
        self.current.as_ref()
    }

    pub fn current_match_mut(&mut self) -> Option<&mut MatchState> {
        self.current.as_mut()
    }

    pub fn matches_played(&self) -> u64 {
        self.matches_played
    }

    /// Join the lobby; only possible on the join screen
    pub fn join(&mut self) -> Option<usize> {
        if self.phase != SessionPhase::Lobby {
            log::debug!("Join ignored outside the lobby");
            return None;
        }
        self.lobby.join()
    }

    /// A player dropped out: frees a lobby slot or removes their bubble
    pub fn leave(&mut self, slot: usize) -> bool {
        match self.phase {
            SessionPhase::Lobby => self.lobby.leave(slot),
            SessionPhase::Playing => {
                let Some(state) = self.current.as_mut() else {
                    return false;
                };
                match state.bubble_by_slot(slot).map(|b| b.id) {
                    Some(actor) => state.remove(actor),
                    None => false,
                }
            }
            SessionPhase::WinScreen { .. } => false,
        }
    }

    /// Zero-based slot of the last match's winner
    pub fn winner_index(&self) -> Option<usize> {
        self.last_winner
    }

    pub fn winner_banner(&self) -> Option<String> {
        self.last_winner.map(|slot| format!("Player {} Wins!", slot + 1))
    }

    /// Advance whichever screen is active, returning match events
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Vec<MatchEvent> {
        match self.phase {
            SessionPhase::Lobby => {
                let held = self
                    .lobby
                    .joined_slots()
                    .into_iter()
                    .any(|slot| input.player(slot).charge);
                if self.lobby.tick(dt, held) {
                    self.start_match();
                    return self.drain_match_events();
                }
                Vec::new()
            }
            SessionPhase::Playing => {
                let Some(state) = self.current.as_mut() else {
                    log::error!("Playing without a match, back to lobby");
                    self.back_to_lobby();
                    return Vec::new();
                };
                tick(state, input, dt);
                let events = state.drain_events();
                if state.is_finished() {
                    self.last_winner = state.winner_slot();
                    self.phase = SessionPhase::WinScreen {
                        remaining: self.tuning.session.win_screen_delay,
                    };
                    log::info!(
                        "Match {} over after {} ticks",
                        self.matches_played,
                        state.time_ticks
                    );
                }
                events
            }
            SessionPhase::WinScreen { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.back_to_lobby();
                } else {
                    self.phase = SessionPhase::WinScreen { remaining };
                }
                Vec::new()
            }
        }
    }

    fn start_match(&mut self) {
        self.matches_played += 1;
        let seed = self.seed.wrapping_add(self.matches_played);
        let mut state = MatchState::new(self.tuning, seed);
        for slot in self.lobby.joined_slots() {
            state.register(slot);
        }
        state.start();
        self.current = Some(state);
        self.phase = SessionPhase::Playing;
    }

    fn drain_match_events(&mut self) -> Vec<MatchEvent> {
        self.current
            .as_mut()
            .map(|state| state.drain_events())
            .unwrap_or_default()
    }

    fn back_to_lobby(&mut self) {
        self.current = None;
        self.lobby.reset();
        self.phase = SessionPhase::Lobby;
    }
}
