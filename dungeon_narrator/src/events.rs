//! Events produced while resolving a turn.
//!
//! Nothing here changes state; events describe what the engine decided so a
//! front end can show it and tests can assert on it.

use std::fmt;

use dungeon_rules::ai::{EnemyMove, EnemySpawn};
use dungeon_rules::combat::AttackReport;
use dungeon_rules::RoomId;

/// How a broken location was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairKind {
    /// `<room>_<direction>` was followed to the neighbouring room.
    Directional,
    /// The `<base>_<index>` part named a room.
    Candidate,
    /// Kept the location from before the turn.
    Previous,
    /// The configured default room.
    Default,
    /// Any existing room.
    Arbitrary,
}

/// Something the engine decided during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// A proposed delta entry was dropped.
    DeltaRejected { key: String, reason: String },

    LocationRepaired {
        proposed: String,
        resolved: RoomId,
        via: RepairKind,
    },

    /// A living enemy punished the player for ignoring it.
    EnemyReacted { enemy: String, damage: i32 },

    PlayerAttacked(AttackReport),

    LevelUp { level: u32 },

    EnemyMoved(EnemyMove),

    EnemySpawned(EnemySpawn),

    PlayerDied,
}

impl TurnEvent {
    pub fn rejected(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        TurnEvent::DeltaRejected {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, TurnEvent::DeltaRejected { .. })
    }
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnEvent::DeltaRejected { key, reason } => {
                write!(f, "ignored change to '{}': {}", key, reason)
            }
            TurnEvent::LocationRepaired { proposed, resolved, via } => {
                write!(f, "location '{}' resolved to {} ({:?})", proposed, resolved, via)
            }
            TurnEvent::EnemyReacted { enemy, damage } => {
                write!(f, "The {} attacks you for {} damage as you ignore it!", enemy, damage)
            }
            TurnEvent::PlayerAttacked(report) => write!(f, "{}", report),
            TurnEvent::LevelUp { level } => write!(f, "You reached level {}!", level),
            TurnEvent::EnemyMoved(step) => {
                write!(f, "A {} moves from {} to {}.", step.enemy, step.from, step.to)
            }
            TurnEvent::EnemySpawned(spawn) => {
                write!(f, "A {} appears in {}.", spawn.enemy, spawn.room)
            }
            TurnEvent::PlayerDied => f.write_str("You have fallen."),
        }
    }
}
