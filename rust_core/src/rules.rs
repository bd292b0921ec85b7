// rust_core/src/rules.rs
// Balance rules for generated cards.
// This file contains pure functions. They take data in and return a verdict.
// They do not talk to a text or image backend; they just compute whether a
// rolled ability is within its rarity's budget, and how hard cards hit.

use crate::models::{AbilityEffect, CardStats, Rarity};
use crate::tables::balance_cap;

/// One effect that went over its cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapBreach {
    pub index: usize,
    pub value: u32,
    pub cap: u32,
}

// Result Enum: Is this ability fair?
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ruling {
    Balanced,
    OverCap(Vec<CapBreach>),
}

impl Ruling {
    pub fn is_balanced(&self) -> bool {
        matches!(self, Ruling::Balanced)
    }
}

pub struct Judge;

impl Judge {
    /// Checks every effect against the (effect type, rarity) cap table.
    pub fn assess_balance(effects: &[AbilityEffect], rarity: Rarity) -> Ruling {
        let breaches: Vec<CapBreach> = effects
            .iter()
            .enumerate()
            .filter_map(|(index, effect)| {
                let cap = balance_cap(effect.effect_type, rarity);
                (effect.value > cap).then_some(CapBreach { index, value: effect.value, cap })
            })
            .collect();

        if breaches.is_empty() {
            Ruling::Balanced
        } else {
            Ruling::OverCap(breaches)
        }
    }

    /// Pulls every over-cap value down to its cap. Returns how many effects were touched.
    pub fn force_clamp(effects: &mut [AbilityEffect], rarity: Rarity) -> usize {
        let mut clamped = 0;
        for effect in effects.iter_mut() {
            let cap = balance_cap(effect.effect_type, rarity);
            if effect.value > cap {
                effect.value = cap;
                clamped += 1;
            }
        }
        clamped
    }

    /// Combat damage = attacker's attack - defender's defense (never negative),
    /// scaled by the element advantage and rounded down.
    pub fn combat_damage(attacker: &CardStats, defender: &CardStats) -> u32 {
        let raw = attacker.attack.saturating_sub(defender.defense);
        let multiplier = attacker.element.damage_multiplier(defender.element);
        (raw as f64 * multiplier).floor() as u32
    }
}

// --- TESTS ---
