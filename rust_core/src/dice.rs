// rust_core/src/dice.rs
// The single seam through which the generator draws randomness.
// Everything random in a card (rarity, element, stat wobble, ability rolls)
// goes through `Dice::unit`, so a test can script the exact draws and a
// seed can reproduce a whole card.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws in `[0, 1)`.
pub trait Dice {
    /// Next uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[min, max]`. Returns `min` when the range is empty.
    fn int_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.unit() * span).floor() as u32;
        min + offset.min(max - min)
    }

    /// Uniform pick from a slice. `None` only for an empty slice.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = (self.unit() * items.len() as f64).floor() as usize;
        items.get(idx.min(items.len() - 1))
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

impl<R: RngCore> Dice for R {
    fn unit(&mut self) -> f64 {
        // 53 random mantissa bits, the same construction rand uses for `gen::<f64>()`.
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Seeded, `Send` source used for reproducible cards.
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Fresh entropy-seeded source for one generation.
pub fn fresh() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}

/// Replays a fixed list of draws, then keeps returning `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    draws: Vec<f64>,
    cursor: usize,
    fallback: f64,
}

impl ScriptedDice {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0, fallback: 0.0 }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// How many scripted draws have been consumed.
    pub fn consumed(&self) -> usize {
        self.cursor.min(self.draws.len())
    }
}

impl Dice for ScriptedDice {
    fn unit(&mut self) -> f64 {
        let draw = self.draws.get(self.cursor).copied().unwrap_or(self.fallback);
        self.cursor += 1;
        draw.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
