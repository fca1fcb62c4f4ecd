//! Game mechanics: stats, equipment slots, item classification, abilities.

mod abilities;
mod items;

pub use abilities::*;
pub use items::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Player stats that equipment may modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Hp,
    Str,
    Dex,
}

/// Equipment slots. At most one item per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Boots,
    Weapon,
    Offhand,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 3] = [
        EquipmentSlot::Boots,
        EquipmentSlot::Weapon,
        EquipmentSlot::Offhand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSlot::Boots => "boots",
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Offhand => "offhand",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EquipmentSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Per-stat deltas contributed by one piece of equipment.
pub type StatBonus = BTreeMap<Stat, i32>;
