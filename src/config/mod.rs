//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::calculate::AnalysisParams;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// AI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Backend type: "ollama" or "anthropic"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL for the AI service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key (remote backends only)
    #[serde(default = "default_ai_key_env")]
    pub api_key_env: String,

    /// Timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_ai_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_ai_key_env(),
            timeout_seconds: default_ai_timeout(),
        }
    }
}

/// External statistics API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsApiConfig {
    #[serde(default)]
    pub enabled: bool,

    /// GraphQL endpoint
    #[serde(default = "default_stats_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_stats_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_stats_timeout")]
    pub timeout_seconds: u64,
}

fn default_stats_endpoint() -> String {
    "https://api.grid.gg/central-data/graphql".to_string()
}

fn default_stats_key_env() -> String {
    "STATS_API_KEY".to_string()
}

fn default_stats_timeout() -> u64 {
    15
}

impl Default for StatsApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_stats_endpoint(),
            api_key_env: default_stats_key_env(),
            timeout_seconds: default_stats_timeout(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stats_api: StatsApiConfig,

    #[serde(default)]
    pub analysis: AnalysisParams,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
            stats_api: StatsApiConfig::default(),
            analysis: AnalysisParams::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ai.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "AI timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.stats_api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Stats API timeout must be greater than 0".to_string(),
            ));
        }

        Url::parse(&self.stats_api.endpoint).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid stats API endpoint {}: {}",
                self.stats_api.endpoint, e
            ))
        })?;

        validate_analysis(&self.analysis)
    }
}

fn validate_analysis(params: &AnalysisParams) -> Result<(), ConfigError> {
    if params.recent_window == 0 {
        return Err(ConfigError::ValidationError(
            "analysis.recent_window must be greater than 0".to_string(),
        ));
    }

    let non_negative = [
        ("trend_threshold", params.trend_threshold),
        ("critical_frequency", params.critical_frequency),
        ("high_frequency", params.high_frequency),
        ("improving_ratio", params.improving_ratio),
        ("declining_ratio", params.declining_ratio),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.{} must be a non-negative number",
                name
            )));
        }
    }

    let confidences = [
        ("high_confidence", params.high_confidence),
        ("low_confidence", params.low_confidence),
        ("category_confidence", params.category_confidence),
    ];
    for (name, value) in confidences {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "analysis.{} must be between 0 and 1",
                name
            )));
        }
    }

    if !params.category_impact_scale.is_finite() {
        return Err(ConfigError::ValidationError(
            "analysis.category_impact_scale must be finite".to_string(),
        ));
    }

    if params.improving_ratio >= params.declining_ratio {
        return Err(ConfigError::ValidationError(
            "analysis.improving_ratio must be below analysis.declining_ratio".to_string(),
        ));
    }

    if params.high_frequency > params.critical_frequency {
        return Err(ConfigError::ValidationError(
            "analysis.high_frequency must not exceed analysis.critical_frequency".to_string(),
        ));
    }

    Ok(())
}
