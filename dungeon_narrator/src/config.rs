//! Session configuration.
//!
//! ```toml
//! save_path = "savegame.json"
//! autoroll = true
//!
//! [rules]
//! grid_width = 8
//! min_population = 3
//!
//! [narrator]
//! model = "gpt-4o"
//! timeout_ms = 20000
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dungeon_rules::RulesConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Narrator boundary settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub model: String,
    /// Environment variable holding the narrator API key.
    pub api_key_env: String,
    pub timeout_ms: u64,
    /// Number of past turns sent along with each request.
    pub history_window: usize,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 30_000,
            history_window: 10,
        }
    }
}

impl NarratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Everything a [`GameSession`](crate::GameSession) needs to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rules: RulesConfig,
    pub narrator: NarratorConfig,
    /// Where `/save` and `/load` read and write. Saving is disabled when unset.
    pub save_path: Option<PathBuf>,
    /// Whether non-movement commands get a d20 skill-check roll.
    pub autoroll: bool,
}

/// Resolved narrator credentials.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_credentials(&self) -> Result<Credentials, ConfigError> {
        self.resolve_credentials_with(|var| std::env::var(var).ok())
    }

    /// Like [`resolve_credentials`](Self::resolve_credentials) with a custom lookup.
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Result<Credentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = &self.narrator.api_key_env;
        match lookup(var).filter(|key| !key.trim().is_empty()) {
            Some(api_key) => Ok(Credentials {
                api_key,
                model: self.narrator.model.clone(),
            }),
            None => Err(ConfigError::MissingCredentials { var: var.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_rules::Ability;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.narrator.timeout(), Duration::from_secs(30));
        assert_eq!(config.narrator.history_window, 10);
        assert_eq!(config.narrator.api_key_env, "OPENAI_API_KEY");
        assert!(config.save_path.is_none());
        assert!(!config.autoroll);
    }

    #[test]
    fn test_partial_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
            autoroll = true
            save_path = "save.json"

            [rules]
            grid_width = 3

            [rules.cooldowns]
            heal = 5

            [narrator]
            timeout_ms = 500
            "#,
        )
        .unwrap();

        assert!(config.autoroll);
        assert_eq!(config.save_path, Some(PathBuf::from("save.json")));
        assert_eq!(config.rules.grid_width, 3);
        assert_eq!(config.rules.grid_height, 6);
        assert_eq!(config.rules.cooldown_for(Ability::Heal), 5);
        assert_eq!(config.narrator.timeout(), Duration::from_millis(500));
        assert_eq!(config.narrator.model, "gpt-4o");
    }

    #[test]
    fn test_invalid_toml() {
        let result = SessionConfig::from_toml_str("autoroll = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_credentials() {
        let config = SessionConfig::default();
        let err = config.resolve_credentials_with(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials { ref var } if var == "OPENAI_API_KEY"));

        let blank = config.resolve_credentials_with(|_| Some("  ".into()));
        assert!(blank.is_err());
    }

    #[test]
    fn test_credentials_are_redacted() {
        let config = SessionConfig::default();
        let creds = config
            .resolve_credentials_with(|var| (var == "OPENAI_API_KEY").then(|| "sk-secret".into()))
            .unwrap();
        assert_eq!(creds.api_key, "sk-secret");
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }
}
