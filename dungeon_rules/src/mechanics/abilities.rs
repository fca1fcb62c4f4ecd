//! Hero abilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The ability catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Heal,
    ShieldBlock,
    FireBreath,
    PowerStrike,
    Backstab,
    TongueWhip,
}

/// How an ability's magnitude is derived from the caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityEffect {
    /// Restore a fixed amount of hit points.
    SelfHeal(i32),
    /// `str + bonus` damage to every living enemy in the room.
    AreaDamage { str_bonus: i32 },
    /// `str * str_mul + dex * dex_mul` damage to the first living enemy.
    SingleTarget { str_mul: i32, dex_mul: i32 },
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Heal,
        Ability::ShieldBlock,
        Ability::FireBreath,
        Ability::PowerStrike,
        Ability::Backstab,
        Ability::TongueWhip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::Heal => "heal",
            Ability::ShieldBlock => "shield_block",
            Ability::FireBreath => "fire_breath",
            Ability::PowerStrike => "power_strike",
            Ability::Backstab => "backstab",
            Ability::TongueWhip => "tongue_whip",
        }
    }

    pub fn effect(&self) -> AbilityEffect {
        match self {
            Ability::Heal => AbilityEffect::SelfHeal(10),
            Ability::ShieldBlock => AbilityEffect::SelfHeal(5),
            Ability::FireBreath => AbilityEffect::AreaDamage { str_bonus: 5 },
            Ability::PowerStrike => AbilityEffect::SingleTarget { str_mul: 2, dex_mul: 0 },
            Ability::Backstab => AbilityEffect::SingleTarget { str_mul: 0, dex_mul: 2 },
            Ability::TongueWhip => AbilityEffect::SingleTarget { str_mul: 1, dex_mul: 1 },
        }
    }

    /// Cooldown length used when the config does not override it.
    pub fn default_cooldown(&self) -> u32 {
        match self {
            Ability::Heal => 3,
            Ability::ShieldBlock => 4,
            Ability::FireBreath => 5,
            Ability::PowerStrike => 3,
            Ability::Backstab => 3,
            Ability::TongueWhip => 2,
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ability::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Starting stat blocks for the selectable heroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroPreset {
    pub name: &'static str,
    pub hp: i32,
    pub str: i32,
    pub dex: i32,
    pub ability: Ability,
}

pub const HERO_PRESETS: [HeroPreset; 6] = [
    HeroPreset { name: "Cleric", hp: 25, str: 4, dex: 3, ability: Ability::Heal },
    HeroPreset { name: "Dragon", hp: 35, str: 8, dex: 2, ability: Ability::FireBreath },
    HeroPreset { name: "Fighter", hp: 30, str: 6, dex: 3, ability: Ability::PowerStrike },
    HeroPreset { name: "Knight", hp: 28, str: 5, dex: 4, ability: Ability::ShieldBlock },
    HeroPreset { name: "Rogue", hp: 22, str: 4, dex: 6, ability: Ability::Backstab },
    HeroPreset { name: "Toad", hp: 18, str: 3, dex: 5, ability: Ability::TongueWhip },
];

/// Look up a hero preset by case-insensitive name.
pub fn hero_preset(name: &str) -> Option<&'static HeroPreset> {
    HERO_PRESETS
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name.trim()))
}
