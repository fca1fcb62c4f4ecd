//! # Dungeon Rules
//!
//! The authoritative dungeon simulation: seeded generation, the game state
//! model, combat and ability resolution, and enemy AI.
//! This crate is the single source of truth for game state and does not contain any narrator logic.

pub mod ai;
pub mod combat;
pub mod config;
pub mod dice;
pub mod entities;
pub mod error;
pub mod generation;
pub mod mechanics;
pub mod world_state;

pub use config::RulesConfig;
pub use dice::{DiceExpr, GameRng};
pub use entities::*;
pub use error::{Result, RulesError};
pub use mechanics::*;
pub use world_state::*;
