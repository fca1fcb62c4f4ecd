//! Error types for the narrator boundary and the session.

use std::time::Duration;

use dungeon_rules::RulesError;
use thiserror::Error;

/// Failure to obtain a reply from the narrator.
///
/// These abandon the turn; the game state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarratorError {
    #[error("narrator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("narrator transport failed: {0}")]
    Transport(String),

    #[error("narrator worker exited without replying")]
    Disconnected,
}

/// Startup configuration problems. A session cannot start with these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing narrator credentials: environment variable {var} is not set")]
    MissingCredentials { var: String },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`GameSession::submit`](crate::GameSession::submit).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Narrator(#[from] NarratorError),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error("save file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the player is dead; load a saved game or start over")]
    PlayerDead,
}

pub type Result<T> = std::result::Result<T, SessionError>;
