//! Client configuration.
//!
//! Sources, highest priority first:
//! 1. environment variables, prefix `TASKHUB_`, nesting separator `__`
//!    (`TASKHUB_API__BASE_URL=https://tasks.example.com`)
//! 2. `taskhub.toml` / `taskhub.local.toml`, or an explicit file
//! 3. built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

const CONFIG_FILE_NAMES: &[&str] = &["taskhub", "taskhub.local"];

pub const DEFAULT_BASE_URL: &str = "https://localhost:7009";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the token slot.
    #[serde(default = "default_session_dir")]
    pub dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".taskhub")
}

fn default_log_level() -> String {
    "warn".to_string()
}

pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(None)
}

/// Load configuration, reading `config_path` instead of the default file
/// names when given. An explicit file must exist.
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.timeout_secs", 0)?
        .set_default("session.dir", ".taskhub")?
        .set_default("log.level", "warn")?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("TASKHUB")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let client_config: ClientConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate_config(&client_config)?;
    Ok(client_config)
}

fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "API base URL cannot be empty".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "API base URL must start with http:// or https://, got {base_url}"
        )));
    }
    if config.session.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "Session directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}
