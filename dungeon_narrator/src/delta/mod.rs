//! The narrator's view of the state schema.
//!
//! Every field the narrator may name is listed here with what it may do to
//! it. Keys missing from these tables are unknown and get dropped; the
//! reconciler never sets fields by name any other way.

mod merge;

pub use merge::deep_merge;

use std::collections::BTreeSet;

use dungeon_rules::{Ability, Player, RoomId, MAX_LEVEL, MAX_XP, STAT_LIMIT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// What the narrator may do with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Writable,
    /// Exists, but only the engine changes it.
    EngineOwned,
    /// Never writable and never reported back.
    Forbidden,
}

/// Why a proposed entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no such field")]
    UnknownField,
    #[error("owned by the engine")]
    EngineOwned,
    #[error("may not be changed")]
    Forbidden,
    #[error("wrong type: {0}")]
    TypeMismatch(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

impl FieldAccess {
    /// The rejection a write to such a field earns, if any.
    pub fn rejection(self) -> Option<Rejection> {
        match self {
            FieldAccess::Writable => None,
            FieldAccess::EngineOwned => Some(Rejection::EngineOwned),
            FieldAccess::Forbidden => Some(Rejection::Forbidden),
        }
    }
}

pub(crate) fn typed<T: DeserializeOwned>(value: &Value) -> Result<T, Rejection> {
    serde_json::from_value(value.clone()).map_err(|e| Rejection::TypeMismatch(e.to_string()))
}

fn bounded_stat(value: &Value) -> Result<i32, Rejection> {
    let stat: i32 = typed(value)?;
    if !(-STAT_LIMIT..=STAT_LIMIT).contains(&stat) {
        return Err(Rejection::Invalid(format!(
            "{} is outside -{}..={}",
            stat, STAT_LIMIT, STAT_LIMIT
        )));
    }
    Ok(stat)
}

/// Top-level fields of the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Seed,
    Rooms,
    Player,
    Turn,
    History,
    AbilityCooldowns,
}

impl StateField {
    pub const ALL: [StateField; 6] = [
        StateField::Seed,
        StateField::Rooms,
        StateField::Player,
        StateField::Turn,
        StateField::History,
        StateField::AbilityCooldowns,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StateField::Seed => "seed",
            StateField::Rooms => "rooms",
            StateField::Player => "player",
            StateField::Turn => "turn",
            StateField::History => "history",
            StateField::AbilityCooldowns => "ability_cooldowns",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn access(self) -> FieldAccess {
        match self {
            StateField::Seed | StateField::Turn => FieldAccess::EngineOwned,
            StateField::History => FieldAccess::Forbidden,
            StateField::Rooms | StateField::Player | StateField::AbilityCooldowns => {
                FieldAccess::Writable
            }
        }
    }
}

/// Fields of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Hp,
    Str,
    Dex,
    Level,
    Xp,
    Inventory,
    Location,
    Ability,
    Equipped,
    EquippedBonuses,
    Conditions,
    TorchLit,
}

impl PlayerField {
    pub const ALL: [PlayerField; 12] = [
        PlayerField::Hp,
        PlayerField::Str,
        PlayerField::Dex,
        PlayerField::Level,
        PlayerField::Xp,
        PlayerField::Inventory,
        PlayerField::Location,
        PlayerField::Ability,
        PlayerField::Equipped,
        PlayerField::EquippedBonuses,
        PlayerField::Conditions,
        PlayerField::TorchLit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PlayerField::Hp => "hp",
            PlayerField::Str => "str",
            PlayerField::Dex => "dex",
            PlayerField::Level => "level",
            PlayerField::Xp => "xp",
            PlayerField::Inventory => "inventory",
            PlayerField::Location => "location",
            PlayerField::Ability => "ability",
            PlayerField::Equipped => "equipped",
            PlayerField::EquippedBonuses => "equipped_bonuses",
            PlayerField::Conditions => "conditions",
            PlayerField::TorchLit => "torch_lit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Equipment state is changed only through equip and unequip, which keep
    /// the recorded bonuses in step with the stats.
    pub fn access(self) -> FieldAccess {
        match self {
            PlayerField::Equipped | PlayerField::EquippedBonuses | PlayerField::TorchLit => {
                FieldAccess::EngineOwned
            }
            _ => FieldAccess::Writable,
        }
    }

    /// Write a proposed value into `player`.
    ///
    /// The value is type-checked first; on error `player` is unchanged.
    /// Numbers must lie within the engine's bounds ([`STAT_LIMIT`],
    /// [`MAX_LEVEL`], [`MAX_XP`]). Locations are accepted as any non-empty id
    /// and resolved afterwards.
    pub fn apply(self, player: &mut Player, value: &Value) -> Result<(), Rejection> {
        if let Some(rejection) = self.access().rejection() {
            return Err(rejection);
        }
        match self {
            PlayerField::Hp => player.hp = bounded_stat(value)?,
            PlayerField::Str => player.strength = bounded_stat(value)?,
            PlayerField::Dex => player.dexterity = bounded_stat(value)?,
            PlayerField::Level => {
                let level: u32 = typed(value)?;
                if !(1..=MAX_LEVEL).contains(&level) {
                    return Err(Rejection::Invalid(format!(
                        "level must be between 1 and {}",
                        MAX_LEVEL
                    )));
                }
                player.level = level;
            }
            PlayerField::Xp => {
                let xp: u32 = typed(value)?;
                if xp > MAX_XP {
                    return Err(Rejection::Invalid(format!("xp above {}", MAX_XP)));
                }
                player.xp = xp;
            }
            PlayerField::Inventory => player.inventory = typed(value)?,
            PlayerField::Location => {
                let id: String = typed(value)?;
                if id.trim().is_empty() {
                    return Err(Rejection::Invalid("empty room id".into()));
                }
                player.location = RoomId::new(id.trim());
            }
            PlayerField::Ability => player.ability = typed::<Option<Ability>>(value)?,
            PlayerField::Conditions => player.conditions = typed::<BTreeSet<String>>(value)?,
            PlayerField::Equipped | PlayerField::EquippedBonuses | PlayerField::TorchLit => {
                unreachable!("engine-owned fields are rejected above")
            }
        }
        Ok(())
    }
}
