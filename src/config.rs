//! Configuration types for the scout web application.

use scout_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Serve fixed sample results instead of scraping.
    pub demo: bool,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Result-page scraping settings.
    pub search: SearchConfig,
    /// LLM analysis settings.
    pub analysis: AnalysisConfig,
    /// Keyword combination defaults.
    pub combiner: CombinerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// LLM analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// API key. Never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Provider base URL, with or without a trailing `/v1`.
    pub base_url: String,
    /// Optional organization ID header.
    pub org_id: Option<String>,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
    /// Request deadline in seconds.
    pub timeout_seconds: u64,
    /// Characters of each result summary included in the prompt.
    pub summary_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".into(),
            org_id: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.3,
            max_tokens: 500,
            timeout_seconds: 60,
            summary_chars: 400,
        }
    }
}

impl AnalysisConfig {
    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}

/// Keyword combination defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerConfig {
    /// Keywords per combination when the request does not say.
    pub default_group_size: usize,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            default_group_size: 2,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::ScoutError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ScoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/scout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("scout").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("scout")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/scout-config/config.toml")
        }
    }

    /// Overlay `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL` from
    /// the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay the `OPENAI_*` variables using `lookup`. Blank values are
    /// ignored; set values replace the file's.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.analysis.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.analysis.base_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.analysis.model = model;
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ScoutError::Config`] describing the first
    /// invalid field.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.search
            .validate()
            .map_err(|e| crate::error::ScoutError::Config(e.to_string()))?;
        if self.analysis.timeout_seconds == 0 {
            return Err(crate::error::ScoutError::Config(
                "analysis.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.combiner.default_group_size == 0 {
            return Err(crate::error::ScoutError::Config(
                "combiner.default_group_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
