//! Error types for the rules crate.

use thiserror::Error;

/// Recoverable failures raised by the simulation.
///
/// Programming errors (an empty dungeon, a catalog miss on an engine-chosen
/// key) are not represented here; they panic at the call site.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid dice expression: {0}")]
    Dice(String),

    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("saved game has no rooms")]
    EmptyDungeon,

    #[error("failed to parse rules config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to (de)serialize game state: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RulesError>;
