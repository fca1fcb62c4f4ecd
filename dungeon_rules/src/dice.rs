//! Seeded randomness and dice expressions.
//!
//! All randomness in the simulation flows through [`GameRng`] so that a fixed
//! seed reproduces the same dungeon and the same spawn decisions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, RulesError};

/// Reproducible random number generator.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a new RNG with a random seed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this RNG was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `1..=sides`. Returns 0 when `sides` is 0.
    pub fn rnd(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.gen_range(1..=sides)
    }

    /// Uniform integer in `low..=high`.
    pub fn range_inclusive(&mut self, low: i32, high: i32) -> i32 {
        self.rng.gen_range(low..=high)
    }

    /// Returns true with the given probability (0.0-1.0).
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    /// A fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.rng.gen_range(0..2) == 1
    }

    /// Choose a random element from a slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rng.gen_range(0..items.len())])
        }
    }

    /// Roll a single d20.
    pub fn d20(&mut self) -> i32 {
        self.rnd(20) as i32
    }

    /// Evaluate a dice expression.
    pub fn roll(&mut self, expr: &DiceExpr) -> i32 {
        match *expr {
            DiceExpr::Flat(value) => value,
            DiceExpr::Dice { count, sides } => {
                (0..count).map(|_| self.rnd(sides) as i32).sum()
            }
        }
    }

    /// Parse and evaluate `NdM` notation, or a plain integer.
    pub fn roll_notation(&mut self, notation: &str) -> Result<i32> {
        let expr = DiceExpr::parse(notation)?;
        Ok(self.roll(&expr))
    }
}

/// A dice expression: either a flat number or `NdM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceExpr {
    Flat(i32),
    Dice { count: u32, sides: u32 },
}

impl DiceExpr {
    /// Parse `NdM` (e.g. `2d6`) or an integer literal. A bare `dM` means `1dM`.
    pub fn parse(notation: &str) -> Result<Self> {
        let notation = notation.trim().to_lowercase();
        if let Ok(value) = notation.parse::<i32>() {
            return Ok(DiceExpr::Flat(value));
        }

        let (count, sides) = notation
            .split_once('d')
            .ok_or_else(|| RulesError::Dice(notation.clone()))?;
        let count = if count.is_empty() {
            1
        } else {
            count
                .parse::<u32>()
                .map_err(|_| RulesError::Dice(notation.clone()))?
        };
        let sides = sides
            .parse::<u32>()
            .map_err(|_| RulesError::Dice(notation.clone()))?;
        if count == 0 || sides == 0 {
            return Err(RulesError::Dice(notation));
        }

        Ok(DiceExpr::Dice { count, sides })
    }
}
