//! Timed item effects
//!
//! Each bubble owns an [`EffectQueue`] that is polled once per tick. An effect
//! runs Inactive → Active → Flickering → Expired: it is applied on start,
//! starts toggling a visibility flag `flicker_window` seconds before the end
//! and restores the bubble's original values when it expires.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bubble::Modifiers;
use crate::tuning::ItemTuning;

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Blocks hazard pops and bubble bounces while active
    Shield,
    /// Multiplies the bubble's charge rate
    PowerCharge,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Shield, ItemKind::PowerCharge];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Shield => "Shield",
            ItemKind::PowerCharge => "PowerCharge",
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Lifecycle of a single effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPhase {
    Inactive,
    Active,
    Flickering,
    Expired,
}

/// Something an effect did this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectEvent {
    Started { kind: ItemKind },
    Flicker { kind: ItemKind, visible: bool },
    Expired { kind: ItemKind },
}

/// A running timed effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEffect {
    pub kind: ItemKind,
    pub phase: EffectPhase,
    /// Seconds since the effect started
    pub elapsed: f32,
    pub duration: f32,
    pub flicker_window: f32,
    pub flicker_rate: f32,
    /// Visual state driven by the flicker toggle
    pub visible: bool,
    /// Toggles emitted since flickering began
    toggles: u32,
    /// Value to put back on expiry (charge rate for PowerCharge)
    original: f32,
    multiplier: f32,
}

impl ItemEffect {
    pub fn new(kind: ItemKind, tuning: &ItemTuning) -> Self {
        Self {
            kind,
            phase: EffectPhase::Inactive,
            elapsed: 0.0,
            duration: tuning.duration,
            flicker_window: tuning.flicker_window.min(tuning.duration),
            flicker_rate: tuning.flicker_rate,
            visible: true,
            toggles: 0,
            original: 0.0,
            multiplier: tuning.power_charge_multiplier,
        }
    }

    /// Seconds left before expiry
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Elapsed time at which flickering starts
    fn flicker_start(&self) -> f32 {
        (self.duration - self.flicker_window).max(0.0)
    }

    fn start(&mut self, mods: &mut Modifiers) {
        match self.kind {
            ItemKind::Shield => {
                mods.shielded = true;
                log::debug!("Shield activated");
            }
            ItemKind::PowerCharge => {
                self.original = mods.charge_rate;
                mods.charge_rate *= self.multiplier;
                log::debug!(
                    "Charge rate boosted from {} to {}",
                    self.original,
                    mods.charge_rate
                );
            }
        }
        self.phase = EffectPhase::Active;
    }

    fn end(&mut self, mods: &mut Modifiers) {
        match self.kind {
            ItemKind::Shield => {
                mods.shielded = false;
                log::debug!("Shield deactivated");
            }
            ItemKind::PowerCharge => {
                mods.charge_rate = self.original;
                log::debug!("Charge rate restored to {}", self.original);
            }
        }
        self.visible = true;
        self.phase = EffectPhase::Expired;
    }

    /// Restart the timer without re-applying the effect
    fn refresh(&mut self) {
        self.elapsed = 0.0;
        self.toggles = 0;
        self.visible = true;
        self.phase = EffectPhase::Active;
    }

    /// Advance the effect clock by `dt`, pushing anything that happened
    fn advance(&mut self, dt: f32, mods: &mut Modifiers, out: &mut Vec<EffectEvent>) {
        if matches!(self.phase, EffectPhase::Inactive | EffectPhase::Expired) {
            return;
        }
        self.elapsed += dt;

        let flicker_start = self.flicker_start();
        if self.phase == EffectPhase::Active && self.elapsed >= flicker_start {
            self.phase = EffectPhase::Flickering;
            self.visible = true;
            out.push(EffectEvent::Flicker {
                kind: self.kind,
                visible: true,
            });
        }

        if self.phase == EffectPhase::Flickering && self.flicker_rate > 0.0 {
            let since = self.elapsed.min(self.duration) - flicker_start;
            loop {
                let next = (self.toggles + 1) as f32 * self.flicker_rate;
                if next > since || flicker_start + next >= self.duration {
                    break;
                }
                self.toggles += 1;
                self.visible = !self.visible;
                out.push(EffectEvent::Flicker {
                    kind: self.kind,
                    visible: self.visible,
                });
            }
        }

        if self.elapsed >= self.duration {
            self.end(mods);
            out.push(EffectEvent::Expired { kind: self.kind });
        }
    }
}

/// Per-bubble timer queue of running effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectQueue {
    effects: Vec<ItemEffect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect, or restart the timer of a running one of the same kind
    pub fn apply(&mut self, kind: ItemKind, tuning: &ItemTuning, mods: &mut Modifiers) -> EffectEvent {
        if let Some(running) = self.effects.iter_mut().find(|e| e.kind == kind) {
            running.refresh();
        } else {
            let mut effect = ItemEffect::new(kind, tuning);
            effect.start(mods);
            self.effects.push(effect);
        }
        EffectEvent::Started { kind }
    }

    /// Poll all effects once; expired effects are removed
    pub fn tick(&mut self, dt: f32, mods: &mut Modifiers) -> Vec<EffectEvent> {
        let mut out = Vec::new();
        for effect in &mut self.effects {
            effect.advance(dt, mods, &mut out);
        }
        self.effects.retain(|e| e.phase != EffectPhase::Expired);
        out
    }

    /// End every effect now, restoring original values (newest first)
    pub fn clear(&mut self, mods: &mut Modifiers) -> Vec<EffectEvent> {
        let mut out = Vec::new();
        while let Some(mut effect) = self.effects.pop() {
            effect.end(mods);
            out.push(EffectEvent::Expired { kind: effect.kind });
        }
        out
    }

    pub fn get(&self, kind: ItemKind) -> Option<&ItemEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn is_active(&self, kind: ItemKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
