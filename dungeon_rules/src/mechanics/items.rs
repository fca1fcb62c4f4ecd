//! Item classification.
//!
//! Classification is a pure function of the item name, driven by an ordered
//! rule table. The first rule whose keyword occurs in the lowercased name wins.

use super::{EquipmentSlot, Stat, StatBonus};

/// What an item does when equipped or used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemClass {
    /// Occupies a slot and grants a stat bonus while equipped.
    Equipment { slot: EquipmentSlot, bonus: StatBonus },
    /// Toggles `torch_lit` instead of occupying a stat slot.
    Light,
    /// Consumed on use, restoring hit points.
    Consumable { heal: i32 },
    /// Keys, map pieces, trophies.
    Misc,
}

impl ItemClass {
    pub fn slot(&self) -> Option<EquipmentSlot> {
        match self {
            ItemClass::Equipment { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    pub fn is_equippable(&self) -> bool {
        matches!(self, ItemClass::Equipment { .. } | ItemClass::Light)
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleEffect {
    Equip(EquipmentSlot, Stat, i32),
    Light,
    Heal(i32),
}

struct ItemRule {
    keywords: &'static [&'static str],
    effect: RuleEffect,
}

const ITEM_RULES: &[ItemRule] = &[
    ItemRule {
        keywords: &["boots"],
        effect: RuleEffect::Equip(EquipmentSlot::Boots, Stat::Dex, 1),
    },
    ItemRule {
        keywords: &["sword", "axe", "dagger"],
        effect: RuleEffect::Equip(EquipmentSlot::Weapon, Stat::Str, 2),
    },
    ItemRule {
        keywords: &["shield"],
        effect: RuleEffect::Equip(EquipmentSlot::Offhand, Stat::Hp, 5),
    },
    ItemRule {
        keywords: &["torch"],
        effect: RuleEffect::Light,
    },
    ItemRule {
        keywords: &["potion"],
        effect: RuleEffect::Heal(10),
    },
];

/// Classify an item by name.
pub fn classify_item(name: &str) -> ItemClass {
    let lowered = name.to_lowercase();
    let rule = ITEM_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)));

    match rule.map(|r| r.effect) {
        Some(RuleEffect::Equip(slot, stat, delta)) => ItemClass::Equipment {
            slot,
            bonus: [(stat, delta)].into_iter().collect(),
        },
        Some(RuleEffect::Light) => ItemClass::Light,
        Some(RuleEffect::Heal(heal)) => ItemClass::Consumable { heal },
        None => ItemClass::Misc,
    }
}
