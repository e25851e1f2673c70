//! Optional TOML settings.
//!
//! Everything has a default; a missing file is not an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engines::EngineId;
use crate::error::SearchError;

pub const CONFIG_ENV_VAR: &str = "POLYSEARCH_CONFIG";

/// `~/.config/polysearch` (or the platform equivalent).
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("polysearch")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
    /// Per-engine model overrides, keyed by engine name (`anthropic`, `sonar-pro`, ...).
    pub models: HashMap<String, String>,
    pub research: ResearchSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("polysearch/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 120,
            endpoints: Endpoints::default(),
            models: HashMap::new(),
            research: ResearchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub brave: String,
    pub anthropic: String,
    pub openai: String,
    pub google: String,
    pub xai: String,
    pub openrouter: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            brave: "https://api.search.brave.com".into(),
            anthropic: "https://api.anthropic.com".into(),
            openai: "https://api.openai.com".into(),
            google: "https://generativelanguage.googleapis.com".into(),
            xai: "https://api.x.ai".into(),
            openrouter: "https://openrouter.ai".into(),
        }
    }
}

impl Endpoints {
    /// Point every provider at one base URL (used against mock servers).
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            brave: base.clone(),
            anthropic: base.clone(),
            openai: base.clone(),
            google: base.clone(),
            xai: base.clone(),
            openrouter: base,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResearchSettings {
    pub max_rounds: usize,
    pub max_parallel: usize,
    pub searches_per_round: usize,
    /// Restrict the planner to these engines; empty means every enabled engine.
    pub default_engines: Vec<String>,
    pub max_result_chars: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            max_parallel: 4,
            searches_per_round: 4,
            default_engines: Vec::new(),
            max_result_chars: 4000,
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SearchError> {
        let config: SearchConfig =
            toml::from_str(s).map_err(|e| SearchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SearchError> {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s)
                .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SearchError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    /// `$POLYSEARCH_CONFIG`, else `~/.config/polysearch/config.toml`.
    pub fn load_default() -> Result<Self, SearchError> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"));
        Self::load_from(&path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn model_override(&self, engine: EngineId) -> Option<&str> {
        self.models.get(engine.as_str()).map(String::as_str)
    }

    fn validate(&self) -> Result<(), SearchError> {
        for name in self.models.keys() {
            name.parse::<EngineId>()
                .map_err(|_| SearchError::Config(format!("unknown engine in [models]: {}", name)))?;
        }
        for name in &self.research.default_engines {
            name.parse::<EngineId>().map_err(|_| {
                SearchError::Config(format!("unknown engine in research.default_engines: {}", name))
            })?;
        }
        if self.research.max_parallel == 0 {
            return Err(SearchError::Config(
                "research.max_parallel must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = SearchConfig::from_toml_str("").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.research.max_rounds, 3);
        assert_eq!(config.endpoints.brave, "https://api.search.brave.com");
    }

    #[test]
    fn test_partial_overrides() {
        let config = SearchConfig::from_toml_str(
            r#"
            request_timeout_secs = 30

            [endpoints]
            brave = "http://localhost:9999"

            [models]
            anthropic = "claude-opus-4-1"

            [research]
            max_rounds = 5
            default_engines = ["brave", "sonar"]
            "#,
        )
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.endpoints.brave, "http://localhost:9999");
        assert_eq!(config.endpoints.openai, "https://api.openai.com");
        assert_eq!(
            config.model_override(EngineId::Anthropic),
            Some("claude-opus-4-1")
        );
        assert_eq!(config.model_override(EngineId::OpenAi), None);
        assert_eq!(config.research.max_rounds, 5);
        assert_eq!(config.research.max_parallel, 4);
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let err = SearchConfig::from_toml_str("[models]\nbing = \"x\"").unwrap_err();
        assert!(err.to_string().contains("unknown engine in [models]: bing"));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = SearchConfig::from_toml_str("request_timeout_secs = \"soon\"").unwrap_err();
        assert_eq!(err.code_str(), "config_error");
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = SearchConfig::load_from(Path::new("/nonexistent/polysearch.toml")).unwrap();
        assert_eq!(config, SearchConfig::default());
    }
}
