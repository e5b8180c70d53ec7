//! Configuration for the relay.
//!
//! Loaded from TOML (every field optional), then overridden from the
//! environment. A `.env` file in the working directory is read first.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SparkError};
use crate::llm::AnthropicConfig;

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Remote model settings.
    pub llm: LlmConfig,
    /// Local planner settings.
    pub planner: PlannerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3001,
        }
    }
}

/// Remote model configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Anthropic API key.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// `anthropic-version` header value.
    pub api_version: String,
    /// Token budget for each completion.
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".to_owned(),
            model: "claude-3-5-sonnet-20241022".to_owned(),
            api_version: "2023-06-01".to_owned(),
            max_tokens: 1024,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("LlmConfig")
            .field("api_key", &key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl From<&LlmConfig> for AnthropicConfig {
    fn from(config: &LlmConfig) -> Self {
        AnthropicConfig::new(config.api_key.clone(), config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_api_version(config.api_version.clone())
    }
}

/// Local planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// IANA zone used for fallback slots when a request names none
    /// (`None` = UTC).
    pub default_timezone: Option<String>,
    /// Number of keywords kept in monthly reports.
    pub top_keywords: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_timezone: None,
            top_keywords: crate::planner::keywords::DEFAULT_TOP_KEYWORDS,
        }
    }
}

impl PlannerConfig {
    /// Parse [`default_timezone`](Self::default_timezone), defaulting to UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA zone.
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        match self.default_timezone.as_deref() {
            None | Some("") => Ok(chrono_tz::UTC),
            Some(name) => name
                .parse()
                .map_err(|_| SparkError::Config(format!("unknown timezone '{name}'"))),
        }
    }
}

impl SparkConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SparkError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SparkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `$SPARK_CONFIG`, else
    /// `<config dir>/spark/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(path) = std::env::var_os("SPARK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("spark")
            .join("config.toml")
    }

    /// Load the file at `path` (or the default path) if it exists, then
    /// apply `.env` and process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be parsed or an override
    /// is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::default_config_path, Path::to_path_buf);
        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "loading config file");
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "loaded .env");
        }
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PORT`, `HOST`, `CLAUDE_API_KEY`, `ANTHROPIC_BASE_URL`, and
    /// `SPARK_TIMEZONE` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| SparkError::Config(format!("invalid PORT '{port}'")))?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(key) = lookup("CLAUDE_API_KEY") {
            self.llm.api_key = key.trim().to_owned();
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(tz) = lookup("SPARK_TIMEZONE") {
            self.planner.default_timezone = Some(tz);
        }
        Ok(())
    }

    /// Check values that would make the relay unusable.
    ///
    /// An empty API key is allowed: analysis requests then always fall
    /// back and report requests fail.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero token budget, an empty model name, or
    /// an unknown default timezone.
    pub fn validate(&self) -> Result<()> {
        if self.llm.max_tokens == 0 {
            return Err(SparkError::Config("llm.max_tokens must be positive".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(SparkError::Config("llm.model must not be empty".into()));
        }
        self.planner.timezone()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = SparkConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.llm.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.planner.top_keywords, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SparkConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [planner]
            default_timezone = "Europe/Paris"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.planner.timezone().unwrap(), chrono_tz::Europe::Paris);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SparkConfig::default();
        config.server.port = 4242;
        config.llm.model = "claude-test".into();
        config.save_to_file(&path).unwrap();

        let loaded = SparkConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 4242);
        assert_eq!(loaded.llm.model, "claude-test");
    }

    #[test]
    fn from_file_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = SparkConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, SparkError::Config(_)));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SparkConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.llm.max_tokens, 1024);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = SparkConfig::default();
        config
            .apply_env_overrides(lookup_from(&[
                ("PORT", "5000"),
                ("HOST", "127.0.0.1"),
                ("CLAUDE_API_KEY", " sk-ant-test \n"),
                ("ANTHROPIC_BASE_URL", "http://localhost:9000"),
                ("SPARK_TIMEZONE", "Asia/Tokyo"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.api_key, "sk-ant-test");
        assert_eq!(config.llm.base_url, "http://localhost:9000");
        assert_eq!(config.planner.timezone().unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn invalid_port_override_fails() {
        let mut config = SparkConfig::default();
        let err = config
            .apply_env_overrides(lookup_from(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid PORT"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SparkConfig::default();
        config.planner.default_timezone = Some("Mars/Olympus".into());
        assert!(config.validate().is_err());

        let mut config = SparkConfig::default();
        config.llm.max_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = LlmConfig::default();
        config.api_key = "sk-ant-secret".into();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn converts_into_anthropic_config() {
        let mut config = LlmConfig::default();
        config.api_key = "k".into();
        config.base_url = "http://mock".into();
        let anthropic = AnthropicConfig::from(&config);
        assert_eq!(anthropic.api_key, "k");
        assert_eq!(anthropic.base_url, "http://mock");
        assert_eq!(anthropic.model, "claude-3-5-sonnet-20241022");
    }
}
