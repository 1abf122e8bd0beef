//! Game balance and arena configuration
//!
//! Loaded from JSON (or built from a preset) before a session starts.
//! Everything the simulation reads as a "magic number" lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArenaPreset {
    Small,
    #[default]
    Classic,
    Wide,
}

impl ArenaPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaPreset::Small => "Small",
            ArenaPreset::Classic => "Classic",
            ArenaPreset::Wide => "Wide",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" => Some(ArenaPreset::Small),
            "classic" | "default" => Some(ArenaPreset::Classic),
            "wide" => Some(ArenaPreset::Wide),
            _ => None,
        }
    }

    /// Half width/height of the playfield
    pub fn half_extents(&self) -> Vec2 {
        match self {
            ArenaPreset::Small => Vec2::new(6.0, 4.0),
            // Orthographic size 5 at 16:9
            ArenaPreset::Classic => Vec2::new(8.89, 5.0),
            ArenaPreset::Wide => Vec2::new(12.0, 5.0),
        }
    }
}

/// Per-bubble movement and size parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleTuning {
    /// Mass at size 1.0
    pub base_weight: f32,
    /// Impulse of an uncharged burst at full size
    pub bop_force: f32,
    /// Charge gained per second while holding
    pub charge_rate: f32,
    /// Linear damping before the size multiplier
    pub base_damping: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Size at spawn and after respawn
    pub initial_size: f32,
    /// Size gained per second while charging
    pub charge_growth_rate: f32,
    /// Size lost per burst
    pub discharge_shrink: f32,
    /// Alpha at zero size while charging (lerps to 1.0 at max size)
    pub charge_transparency: f32,
}

impl Default for BubbleTuning {
    fn default() -> Self {
        Self {
            base_weight: 1.0,
            bop_force: 2.0,
            charge_rate: 2.0,
            base_damping: 5.0,
            min_size: 0.5,
            max_size: 5.0,
            initial_size: 1.0,
            charge_growth_rate: 0.5,
            discharge_shrink: 0.1,
            charge_transparency: 0.5,
        }
    }
}

/// Item pickup and timed effect parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    /// Total effect duration (seconds)
    pub duration: f32,
    /// Warning window at the end of the effect (seconds)
    pub flicker_window: f32,
    /// Seconds between flicker toggles
    pub flicker_rate: f32,
    /// Charge rate multiplier of the power-charge item
    pub power_charge_multiplier: f32,
    /// Delay before a spawn point places a new pickup (seconds)
    pub spawn_delay: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            duration: 7.0,
            flicker_window: 1.5,
            flicker_rate: 0.1,
            power_charge_multiplier: 2.0,
            spawn_delay: 5.0,
        }
    }
}

/// Match rules: lives, bounces, respawns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    pub lives: u8,
    /// Restitution applied to the relative speed of two bubbles on contact
    pub restitution: f32,
    /// Extra bounce impulse per unit of size difference
    pub size_bonus: f32,
    /// Time a popped bubble stays off the field (seconds)
    pub respawn_delay: f32,
    /// Input lock after match start and after each respawn (seconds)
    pub control_delay: f32,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            lives: 3,
            restitution: 1.2,
            size_bonus: 0.5,
            respawn_delay: 2.0,
            control_delay: 1.0,
        }
    }
}

/// Arena walls and hazards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub preset: ArenaPreset,
    /// Bounciness of the boundary walls
    pub wall_bounciness: f32,
    /// Cone (degrees) around a spike's direction that pops bubbles
    pub spike_dead_zone_deg: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            preset: ArenaPreset::Classic,
            wall_bounciness: 0.8,
            spike_dead_zone_deg: 90.0,
        }
    }
}

/// Join screen and win screen timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Charge hold needed on the join screen to start (seconds)
    pub start_hold_time: f32,
    pub min_players: usize,
    /// Time the win screen is shown before returning to the lobby (seconds)
    pub win_screen_delay: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            start_hold_time: 1.0,
            min_players: 2,
            win_screen_delay: 3.0,
        }
    }
}

/// Invalid tuning values
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("{field} must be finite and > 0 (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite and >= 0 (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("min_size ({min}) must be below max_size ({max})")]
    SizeRange { min: f32, max: f32 },
    #[error("flicker_window ({window}) must not exceed duration ({duration})")]
    FlickerWindow { window: f32, duration: f32 },
    #[error("lives must be at least 1")]
    NoLives,
    #[error("min_players must be between 1 and {max} (got {value})")]
    MinPlayers { value: usize, max: usize },
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative { field, value })
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub bubble: BubbleTuning,
    pub items: ItemTuning,
    pub rules: MatchTuning,
    pub arena: ArenaTuning,
    pub session: SessionTuning,
}

impl Tuning {
    /// Default balance on the given arena
    pub fn from_preset(preset: ArenaPreset) -> Self {
        let mut tuning = Self::default();
        tuning.arena.preset = preset;
        tuning
    }

    /// Parse and validate a JSON balance sheet; missing fields keep defaults
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning (arena {}, {} lives)",
            tuning.arena.preset.as_str(),
            tuning.rules.lives
        );
        Ok(tuning)
    }

    pub fn to_json_string(&self) -> String {
        // Plain data with no maps keyed by non-strings, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// This tuning if it validates, otherwise the defaults (logged)
    pub fn validated_or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::error!("Invalid tuning ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let b = &self.bubble;
        positive("base_weight", b.base_weight)?;
        positive("bop_force", b.bop_force)?;
        non_negative("charge_rate", b.charge_rate)?;
        non_negative("base_damping", b.base_damping)?;
        positive("min_size", b.min_size)?;
        positive("max_size", b.max_size)?;
        if b.min_size >= b.max_size {
            return Err(TuningError::SizeRange {
                min: b.min_size,
                max: b.max_size,
            });
        }
        positive("initial_size", b.initial_size)?;
        non_negative("charge_growth_rate", b.charge_growth_rate)?;
        non_negative("discharge_shrink", b.discharge_shrink)?;
        positive("charge_transparency", b.charge_transparency)?;

        let i = &self.items;
        positive("duration", i.duration)?;
        non_negative("flicker_window", i.flicker_window)?;
        if i.flicker_window > i.duration {
            return Err(TuningError::FlickerWindow {
                window: i.flicker_window,
                duration: i.duration,
            });
        }
        positive("flicker_rate", i.flicker_rate)?;
        positive("power_charge_multiplier", i.power_charge_multiplier)?;
        non_negative("spawn_delay", i.spawn_delay)?;

        let r = &self.rules;
        if r.lives == 0 {
            return Err(TuningError::NoLives);
        }
        non_negative("restitution", r.restitution)?;
        non_negative("size_bonus", r.size_bonus)?;
        non_negative("respawn_delay", r.respawn_delay)?;
        non_negative("control_delay", r.control_delay)?;

        non_negative("wall_bounciness", self.arena.wall_bounciness)?;
        non_negative("spike_dead_zone_deg", self.arena.spike_dead_zone_deg)?;

        let s = &self.session;
        non_negative("start_hold_time", s.start_hold_time)?;
        non_negative("win_screen_delay", s.win_screen_delay)?;
        if s.min_players == 0 || s.min_players > crate::consts::MAX_PLAYERS {
            return Err(TuningError::MinPlayers {
                value: s.min_players,
                max: crate::consts::MAX_PLAYERS,
            });
        }

        Ok(())
    }
}
