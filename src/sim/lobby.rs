//! Join screen
//!
//! Players claim slots, then anyone holds charge to start once enough have
//! joined. Letting go resets the hold timer.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PLAYERS;
use crate::tuning::SessionTuning;

/// What a lobby slot should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPrompt {
    /// Open slot
    Join,
    /// Taken, waiting for more players (1-based number)
    Player(usize),
    /// Enough players; hold to start
    HoldToStart,
}

impl SlotPrompt {
    pub fn text(&self) -> String {
        match self {
            SlotPrompt::Join => "Press A to Join".to_string(),
            SlotPrompt::Player(n) => format!("Player {}", n),
            SlotPrompt::HoldToStart => "Hold Charge to Start!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    slots: [bool; MAX_PLAYERS],
    hold_time: f32,
    starting: bool,
    tuning: SessionTuning,
}

impl Lobby {
    pub fn new(tuning: SessionTuning) -> Self {
        Self {
            slots: [false; MAX_PLAYERS],
            hold_time: 0.0,
            starting: false,
            tuning,
        }
    }

    /// Claim the lowest free slot
    ///
    /// Ignored (returns `None`) while full or once the start has fired.
    pub fn join(&mut self) -> Option<usize> {
        if self.starting {
            log::debug!("Join ignored, game starting");
            return None;
        }
        let Some(slot) = self.slots.iter().position(|taken| !taken) else {
            log::debug!("Join ignored, lobby full");
            return None;
        };
        self.slots[slot] = true;
        log::info!("Player {} joined the lobby", slot + 1);
        Some(slot)
    }

    pub fn leave(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(taken) if *taken => {
                *taken = false;
                log::info!("Player {} left the lobby", slot + 1);
                true
            }
            _ => {
                log::warn!("Leave for empty lobby slot {}", slot);
                false
            }
        }
    }

    pub fn player_count(&self) -> usize {
        self.slots.iter().filter(|taken| **taken).count()
    }

    pub fn is_joined(&self, slot: usize) -> bool {
        self.slots.get(slot).copied().unwrap_or(false)
    }

    /// Joined slots in ascending order
    pub fn joined_slots(&self) -> Vec<usize> {
        (0..MAX_PLAYERS).filter(|&slot| self.slots[slot]).collect()
    }

    pub fn can_start(&self) -> bool {
        self.player_count() >= self.tuning.min_players
    }

    /// Seconds the start button has been held
    pub fn hold_time(&self) -> f32 {
        self.hold_time
    }

    /// Hold progress toward the start on [0, 1]
    pub fn hold_progress(&self) -> f32 {
        crate::inverse_lerp(0.0, self.tuning.start_hold_time, self.hold_time)
    }

    pub fn is_starting(&self) -> bool {
        self.starting
    }

    /// Advance the hold timer; returns true on the tick the game should start
    pub fn tick(&mut self, dt: f32, charge_held: bool) -> bool {
        if self.starting {
            return false;
        }
        if !charge_held || !self.can_start() {
            self.hold_time = 0.0;
            return false;
        }

        self.hold_time += dt;
        log::trace!("Start hold {:.2}/{:.2}", self.hold_time, self.tuning.start_hold_time);
        if self.hold_time >= self.tuning.start_hold_time {
            log::info!("Starting game with {} players", self.player_count());
            self.starting = true;
            return true;
        }
        false
    }

    pub fn slot_prompt(&self, slot: usize) -> SlotPrompt {
        if !self.is_joined(slot) {
            SlotPrompt::Join
        } else if self.can_start() {
            SlotPrompt::HoldToStart
        } else {
            SlotPrompt::Player(slot + 1)
        }
    }

    /// Empty every slot for the next round
    pub fn reset(&mut self) {
        self.slots = [false; MAX_PLAYERS];
        self.hold_time = 0.0;
        self.starting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_fills_lowest_free_slot() {
        let mut lobby = Lobby::new(SessionTuning::default());
        assert_eq!(lobby.join(), Some(0));
        assert_eq!(lobby.join(), Some(1));
        assert_eq!(lobby.join(), Some(2));
        assert!(lobby.leave(1));
        assert_eq!(lobby.join(), Some(1));
        assert_eq!(lobby.join(), Some(3));
        assert_eq!(lobby.join(), None);
        assert!(!lobby.leave(7));
    }

    #[test]
    fn test_hold_needs_two_players() {
        let mut lobby = Lobby::new(SessionTuning::default());
        lobby.join();
        for _ in 0..120 {
            assert!(!lobby.tick(1.0 / 60.0, true));
        }
        assert_eq!(lobby.hold_time(), 0.0);
    }

    #[test]
    fn test_release_resets_hold() {
        let mut lobby = Lobby::new(SessionTuning::default());
        lobby.join();
        lobby.join();
        assert!(!lobby.tick(0.6, true));
        assert!(!lobby.tick(0.1, false));
        assert_eq!(lobby.hold_time(), 0.0);
        assert!(!lobby.tick(0.6, true));
        assert!(lobby.tick(0.5, true));

        // Started: no more joins or restarts
        assert!(lobby.is_starting());
        assert_eq!(lobby.join(), None);
        assert!(!lobby.tick(1.0, true));
    }

    #[test]
    fn test_prompts() {
        let mut lobby = Lobby::new(SessionTuning::default());
        lobby.join();
        assert_eq!(lobby.slot_prompt(0), SlotPrompt::Player(1));
        assert_eq!(lobby.slot_prompt(1).text(), "Press A to Join");
        lobby.join();
        assert_eq!(lobby.slot_prompt(1).text(), "Hold Charge to Start!");
    }
}
