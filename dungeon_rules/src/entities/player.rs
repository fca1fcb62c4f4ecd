//! The player character.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use super::RoomId;
use crate::mechanics::{classify_item, Ability, EquipmentSlot, HeroPreset, ItemClass, Stat, StatBonus};

/// Hit points gained per level.
pub const LEVEL_UP_HP: i32 = 5;

/// Highest level a player can be set to from outside the engine.
pub const MAX_LEVEL: u32 = 1_000;

/// Largest xp value accepted from outside the engine.
pub const MAX_XP: u32 = 1_000_000;

/// Bound on the magnitude of hp, str and dex accepted from outside the engine.
pub const STAT_LIMIT: i32 = 1_000_000;

/// The player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// May drop to zero or below, meaning dead.
    pub hp: i32,
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    pub level: u32,
    pub xp: u32,
    pub inventory: Vec<String>,
    pub location: RoomId,
    pub ability: Option<Ability>,
    #[serde(default)]
    pub equipped: BTreeMap<EquipmentSlot, String>,
    /// Mirrors `equipped`: exactly the bonus applied for each occupied slot.
    #[serde(default)]
    pub equipped_bonuses: BTreeMap<EquipmentSlot, StatBonus>,
    #[serde(default)]
    pub conditions: BTreeSet<String>,
    #[serde(default)]
    pub torch_lit: bool,
}

impl Player {
    /// A default adventurer standing in `location`.
    pub fn new(location: RoomId) -> Self {
        Self {
            hp: 20,
            strength: 4,
            dexterity: 3,
            level: 1,
            xp: 0,
            inventory: Vec::new(),
            location,
            ability: None,
            equipped: BTreeMap::new(),
            equipped_bonuses: BTreeMap::new(),
            conditions: BTreeSet::new(),
            torch_lit: false,
        }
    }

    pub fn from_hero(preset: &HeroPreset, location: RoomId) -> Self {
        Self {
            hp: preset.hp,
            strength: preset.str,
            dexterity: preset.dex,
            ability: Some(preset.ability),
            ..Self::new(location)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// XP required to leave the current level.
    pub fn xp_threshold(&self) -> u32 {
        self.level.saturating_mul(100)
    }

    /// Grant experience, levelling up as many times as it covers.
    ///
    /// The threshold is re-evaluated against the new level after every
    /// level-up. Arithmetic saturates. Returns the number of levels gained.
    pub fn give_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_threshold() {
            self.xp -= self.xp_threshold();
            self.level = self.level.saturating_add(1);
            self.hp = self.hp.saturating_add(LEVEL_UP_HP);
            self.strength = self.strength.saturating_add(1);
            self.dexterity = self.dexterity.saturating_add(1);
            gained += 1;
            tracing::info!(level = self.level, "player levelled up");
        }
        gained
    }

    fn apply_bonus(&mut self, bonus: &StatBonus, sign: i32) {
        for (stat, delta) in bonus {
            match stat {
                Stat::Hp => self.hp = self.hp.saturating_add(sign * delta),
                Stat::Str => self.strength = self.strength.saturating_add(sign * delta),
                Stat::Dex => self.dexterity = self.dexterity.saturating_add(sign * delta),
            }
        }
    }

    /// Equip an item from the inventory.
    ///
    /// Any item already in the target slot is unequipped first, reversing
    /// exactly the bonus recorded for it.
    pub fn equip_item(&mut self, item: &str) -> Result<EquipOutcome, EquipError> {
        if !self.inventory.iter().any(|i| i == item) {
            return Err(EquipError::NotInInventory(item.to_string()));
        }

        match classify_item(item) {
            ItemClass::Light => {
                self.torch_lit = true;
                Ok(EquipOutcome::TorchLit)
            }
            ItemClass::Equipment { slot, bonus } => {
                let replaced = self.unequip_slot(slot);
                self.apply_bonus(&bonus, 1);
                self.equipped.insert(slot, item.to_string());
                self.equipped_bonuses.insert(slot, bonus);
                Ok(EquipOutcome::Equipped {
                    item: item.to_string(),
                    slot,
                    replaced,
                })
            }
            _ => Err(EquipError::NotEquippable(item.to_string())),
        }
    }

    /// Clear a slot, reversing its recorded bonus. Returns the removed item.
    pub fn unequip_slot(&mut self, slot: EquipmentSlot) -> Option<String> {
        let item = self.equipped.remove(&slot)?;
        if let Some(bonus) = self.equipped_bonuses.remove(&slot) {
            self.apply_bonus(&bonus, -1);
        }
        Some(item)
    }

    /// Unequip by item name or slot name. A torch is put out.
    pub fn unequip(&mut self, target: &str) -> Option<String> {
        if let Ok(slot) = target.parse::<EquipmentSlot>() {
            return self.unequip_slot(slot);
        }
        if classify_item(target) == ItemClass::Light {
            if !self.torch_lit {
                return None;
            }
            self.torch_lit = false;
            return Some(target.to_string());
        }
        let slot = self
            .equipped
            .iter()
            .find(|(_, name)| name.as_str() == target)
            .map(|(slot, _)| *slot)?;
        self.unequip_slot(slot)
    }

    /// Use an inventory item: drink potions, equip gear.
    pub fn use_item(&mut self, item: &str) -> Result<UseOutcome, EquipError> {
        let position = self
            .inventory
            .iter()
            .position(|i| i == item)
            .ok_or_else(|| EquipError::NotInInventory(item.to_string()))?;

        match classify_item(item) {
            ItemClass::Consumable { heal } => {
                self.inventory.remove(position);
                self.hp = self.hp.saturating_add(heal);
                Ok(UseOutcome::Consumed {
                    item: item.to_string(),
                    heal,
                })
            }
            class if class.is_equippable() => self.equip_item(item).map(UseOutcome::Equipped),
            _ => Ok(UseOutcome::NothingHappens(item.to_string())),
        }
    }

    /// Sum of all recorded equipment bonuses for one stat.
    pub fn equipment_bonus(&self, stat: Stat) -> i32 {
        self.equipped_bonuses
            .values()
            .filter_map(|bonus| bonus.get(&stat))
            .sum()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EquipError {
    #[error("You don't have {0}.")]
    NotInInventory(String),
    #[error("You can't equip {0}.")]
    NotEquippable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipOutcome {
    Equipped {
        item: String,
        slot: EquipmentSlot,
        replaced: Option<String>,
    },
    TorchLit,
}

impl fmt::Display for EquipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipOutcome::Equipped { item, slot, replaced: Some(old) } => {
                write!(f, "You swap {} for {} ({}).", old, item, slot)
            }
            EquipOutcome::Equipped { item, slot, replaced: None } => {
                write!(f, "You equip {} ({}).", item, slot)
            }
            EquipOutcome::TorchLit => f.write_str("You light the torch."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseOutcome {
    Consumed { item: String, heal: i32 },
    Equipped(EquipOutcome),
    NothingHappens(String),
}

impl fmt::Display for UseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseOutcome::Consumed { item, heal } => {
                write!(f, "You use the {} and recover {} HP.", item, heal)
            }
            UseOutcome::Equipped(outcome) => outcome.fmt(f),
            UseOutcome::NothingHappens(item) => write!(f, "Nothing happens with the {}.", item),
        }
    }
}
