//! Rules configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::RoomId;
use crate::error::Result;
use crate::mechanics::Ability;

/// Tunables for the simulation. Every key is optional in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Minimum number of living non-boss enemies kept in the dungeon.
    pub min_population: usize,
    /// Fallback room when the player's location cannot be repaired.
    pub default_room: RoomId,
    /// Cooldown overrides per ability, in turns.
    pub cooldowns: BTreeMap<Ability, u32>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            grid_width: 6,
            grid_height: 6,
            min_population: 2,
            default_room: RoomId::from_index(0),
            cooldowns: BTreeMap::new(),
        }
    }
}

impl RulesConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Cooldown length for an ability.
    pub fn cooldown_for(&self, ability: Ability) -> u32 {
        self.cooldowns
            .get(&ability)
            .copied()
            .unwrap_or_else(|| ability.default_cooldown())
    }
}
