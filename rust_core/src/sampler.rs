// rust_core/src/sampler.rs
// Weighted rarity and element draws.

use crate::dice::Dice;
use crate::models::{Element, Rarity};
use crate::tables::{element_weights, RARITY_WEIGHTS};

/// Walks `table` in order, subtracting each weight from a draw in `[0, total)`.
/// Returns the first entry that takes the draw to zero or below.
/// Floating-point leftovers fall back to `table[0]`.
fn weighted_walk<T: Copy>(table: &[(T, f64)], dice: &mut impl Dice) -> Option<T> {
    let (first, _) = *table.first()?;
    let total: f64 = table.iter().map(|(_, w)| *w).sum();
    let mut remaining = dice.unit() * total;

    for (entry, weight) in table {
        remaining -= weight;
        if remaining <= 0.0 {
            return Some(*entry);
        }
    }

    Some(first)
}

pub fn sample_rarity(dice: &mut impl Dice) -> Rarity {
    weighted_walk(&RARITY_WEIGHTS, dice).unwrap_or(Rarity::Common)
}

pub fn sample_element(rarity: Rarity, dice: &mut impl Dice) -> Element {
    weighted_walk(element_weights(rarity), dice).unwrap_or(Element::Wholesome)
}
