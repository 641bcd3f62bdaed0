use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ForgetError, Result};

/// Main configuration structure for getforget
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Entry creation and importance decay
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Background forgetting process
    #[serde(default)]
    pub forgetting: ForgettingConfig,
    /// Keyword extraction
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Read-time relevance queries
    #[serde(default)]
    pub query: QueryConfig,
    /// Chat reply phrasing
    #[serde(default)]
    pub reply: ReplyConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists, falling back to built-in defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".getforget").join("config.toml")),
            dirs::config_dir().map(|c| c.join("getforget").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Read and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForgetError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ForgetError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the importance formula or the timer
    pub fn validate(&self) -> Result<()> {
        if !(self.memory.decay_hours.is_finite() && self.memory.decay_hours > 0.0) {
            return Err(ForgetError::Config(format!(
                "memory.decay_hours must be positive, got {}",
                self.memory.decay_hours
            )));
        }
        if !(self.memory.min_base_importance.is_finite()
            && self.memory.max_base_importance.is_finite()
            && self.memory.min_base_importance < self.memory.max_base_importance)
        {
            return Err(ForgetError::Config(format!(
                "memory base importance range [{}, {}) is empty",
                self.memory.min_base_importance, self.memory.max_base_importance
            )));
        }
        if self.memory.min_base_importance <= 0.0 {
            return Err(ForgetError::Config(
                "memory.min_base_importance must be positive".to_string(),
            ));
        }
        if self.forgetting.interval_secs == 0 {
            return Err(ForgetError::Config(
                "forgetting.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.query.max_results == 0 {
            return Err(ForgetError::Config(
                "query.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Origins allowed to call the API from a browser
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_origins: default_allowed_origins(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Entry creation and decay parameters
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Decay time constant τ in hours
    #[serde(default = "default_decay_hours")]
    pub decay_hours: f64,
    /// Lower bound (inclusive) for sampled base importance
    #[serde(default = "default_min_base_importance")]
    pub min_base_importance: f64,
    /// Upper bound (exclusive) for sampled base importance
    #[serde(default = "default_max_base_importance")]
    pub max_base_importance: f64,
    /// Fixed RNG seed; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_hours: default_decay_hours(),
            min_base_importance: default_min_base_importance(),
            max_base_importance: default_max_base_importance(),
            seed: None,
        }
    }
}

fn default_decay_hours() -> f64 {
    24.0
}

fn default_min_base_importance() -> f64 {
    50.0
}

fn default_max_base_importance() -> f64 {
    100.0
}

/// Background forgetting process configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForgettingConfig {
    /// Run the periodic forgetting process
    #[serde(default = "default_forgetting_enabled")]
    pub enabled: bool,
    /// Seconds between forgetting cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ForgettingConfig {
    fn default() -> Self {
        Self {
            enabled: default_forgetting_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_forgetting_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    10
}

/// Which tokenizer strategy extracts keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerStrategy {
    /// Split on whitespace
    #[default]
    Whitespace,
    /// Split on script boundaries (suits text without word spacing)
    Script,
}

/// Keyword extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfig {
    /// Tokenizer strategy
    #[serde(default)]
    pub strategy: TokenizerStrategy,
    /// Tokens must be strictly longer than this many characters
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
    /// Threshold used instead for scripts written without spaces
    #[serde(default = "default_min_unspaced_len")]
    pub min_unspaced_len: usize,
    /// Lowercase tokens before using them as keys
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            strategy: TokenizerStrategy::default(),
            min_word_len: default_min_word_len(),
            min_unspaced_len: default_min_unspaced_len(),
            lowercase: default_lowercase(),
        }
    }
}

fn default_min_word_len() -> usize {
    3
}

fn default_min_unspaced_len() -> usize {
    1
}

fn default_lowercase() -> bool {
    true
}

/// Read-time relevance query configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Maximum entries returned per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Apply a random draw against retention probability at read time
    #[serde(default = "default_random_threshold")]
    pub random_threshold: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            random_threshold: default_random_threshold(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

fn default_random_threshold() -> bool {
    true
}

/// Phrasing of the chat reply
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Prefix placed before recalled content
    #[serde(default = "default_recalled_prefix")]
    pub recalled_prefix: String,
    /// Reply when nothing was recalled
    #[serde(default = "default_nothing_recalled")]
    pub nothing_recalled: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            recalled_prefix: default_recalled_prefix(),
            nothing_recalled: default_nothing_recalled(),
        }
    }
}

fn default_recalled_prefix() -> String {
    "I remember our earlier conversation: ".to_string()
}

fn default_nothing_recalled() -> String {
    "Sorry, my memory of that is hazy...".to_string()
}
