// rust_core/src/stats.rs
// Attack / defense / cost derivation.
// A rarity fixes the power budget, the element decides how it is split.

use crate::dice::Dice;
use crate::models::{Element, Rarity, Stats};
use crate::tables::{element_bias, power_budget};

pub const MIN_COST: u32 = 1;
pub const MAX_COST: u32 = 10;

/// `ceil(budget * pct / 100)` without going through floats.
fn share_of(budget: u32, pct: u32) -> u32 {
    (budget * pct).div_ceil(100)
}

/// Mana cost for a given attack + defense total.
pub fn cost_for_power(power: u32) -> u32 {
    power.div_ceil(3).clamp(MIN_COST, MAX_COST)
}

pub fn derive_stats(element: Element, rarity: Rarity, dice: &mut impl Dice) -> Stats {
    let budget = power_budget(rarity);
    let bias = element_bias(element);

    let base_attack = share_of(budget, bias.attack_pct) as i64;
    let base_defense = share_of(budget, bias.defense_pct) as i64;

    // Zero-mean wobble: whatever attack gains, defense gives up.
    let variation = dice.int_inclusive(0, 2) as i64 - 1;
    let attack = (base_attack + variation).max(1) as u32;
    let defense = (base_defense - variation).max(1) as u32;

    Stats {
        attack,
        defense,
        cost: cost_for_power(attack + defense),
    }
}
