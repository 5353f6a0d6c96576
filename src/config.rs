use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data_api::DEFAULT_API_BASE;
use crate::strategy::StrategyKind;
use crate::youtube::{DEFAULT_BASE_URL, USER_AGENT};

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind: String,
    /// Per-call timeout for upstream requests
    pub timeout_secs: u64,
    /// Caption language to look for
    pub language: String,
    /// Caption strategies, tried in this order
    pub strategies: Vec<StrategyKind>,
    /// Key for the Data API metadata lookup
    pub youtube_api_key: Option<String>,
    /// User-Agent sent with watch-page and timed-text requests
    pub user_agent: String,
    pub youtube_base_url: String,
    pub data_api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            timeout_secs: 10,
            language: "en".to_string(),
            strategies: StrategyKind::default_order(),
            youtube_api_key: None,
            user_agent: USER_AGENT.to_string(),
            youtube_base_url: DEFAULT_BASE_URL.to_string(),
            data_api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Load config from `path`, or ~/.config/ytscribe/config.toml, if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        let config = if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            debug!("No config file found at {}", path.display());
            Config::default()
        };
        Ok(config.with_env_key(std::env::var(API_KEY_ENV).ok()))
    }

    /// An API key from the environment wins over the file
    pub fn with_env_key(mut self, env_key: Option<String>) -> Self {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.youtube_api_key = Some(key);
        }
        self
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytscribe")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
bind = "0.0.0.0:8080"
timeout_secs = 5
language = "de"
strategies = ["timedtext"]
youtube_api_key = "AIzaSyB123"
user_agent = "ytscribe-test/1.0"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.language, "de");
        assert_eq!(config.strategies, vec![StrategyKind::Timedtext]);
        assert_eq!(config.youtube_api_key.as_deref(), Some("AIzaSyB123"));
        assert_eq!(config.user_agent, "ytscribe-test/1.0");
        assert_eq!(config.youtube_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.strategies, StrategyKind::default_order());
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(r#"language = "fr""#).unwrap();
        assert_eq!(config.language, "fr");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.user_agent, USER_AGENT);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(toml::from_str::<Config>(r#"strategies = ["whisper"]"#).is_err());
    }

    #[test]
    fn test_env_key_overrides_file() {
        let config = Config {
            youtube_api_key: Some("from-file".into()),
            ..Config::default()
        };
        let config = config.with_env_key(Some("from-env".into()));
        assert_eq!(config.youtube_api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_env_key_ignored() {
        let config = Config {
            youtube_api_key: Some("from-file".into()),
            ..Config::default()
        };
        let config = config.with_env_key(Some("  ".into()));
        assert_eq!(config.youtube_api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/ytscribe/config.toml"))).unwrap();
        assert_eq!(config.language, "en");
    }
}
