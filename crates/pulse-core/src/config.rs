use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "pulse.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub ai: AiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// SQLite file backing the live store. Unset means fixture mode.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: None,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

impl AiConfig {
    /// Both an endpoint and a key are needed to reach the service.
    pub fn is_configured(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
            && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Profile id recorded on activity entries.
    pub actor_id: Option<String>,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    /// Defaults, then the TOML file (an explicit path must exist; the default
    /// `pulse.toml` is optional), then `PULSE_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(path) = get("PULSE_DATABASE_PATH") {
            self.backend.database_path = Some(PathBuf::from(path));
        }
        if let Some(endpoint) = get("PULSE_AI_ENDPOINT") {
            self.ai.endpoint = Some(endpoint);
        }
        if let Some(key) = get("PULSE_AI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = get("PULSE_AI_MODEL") {
            self.ai.model = Some(model);
        }
        if let Some(actor) = get("PULSE_ACTOR_ID") {
            self.session.actor_id = Some(actor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_run_offline() {
        let config = Config::default();
        assert!(config.backend.database_path.is_none());
        assert!(!config.ai.is_configured());
        assert_eq!(config.ai.max_tokens, 2048);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            database_path = "data/pulse.db"

            [ai]
            endpoint = "https://reasoning.example/v1/messages"
            timeout_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(
            config.backend.database_path.as_deref(),
            Some(Path::new("data/pulse.db"))
        );
        assert_eq!(config.ai.timeout_secs, 15);
        assert_eq!(config.ai.max_tokens, 2048);
        assert!(!config.ai.is_configured());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[backend"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_toml_str("[ai]\nmodel = \"small\"\n").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("PULSE_AI_MODEL", "large"),
            ("PULSE_AI_ENDPOINT", "https://reasoning.example"),
            ("PULSE_AI_API_KEY", "secret"),
            ("PULSE_ACTOR_ID", ""),
        ]);
        config.apply_env(|key| env.get(key).map(|value| (*value).to_string()));
        assert_eq!(config.ai.model.as_deref(), Some("large"));
        assert!(config.ai.is_configured());
        assert!(config.session.actor_id.is_none());
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(&path, "[session]\nactor_id = \"usr_andi\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert!(config.session.actor_id.is_some());
    }
}
