//! Configuration layer: typed settings with layered precedence (file → env).

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tidepool";
const ENV_PREFIX: &str = "TIDEPOOL";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl SettingsError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Fully resolved crate settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Connection parameters for the remote document store.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the upstream API, e.g. `https://content.example.com`.
    pub base_url: String,
    pub api_token: String,
    /// Collection holding the post records.
    pub collection_id: String,
    /// Project relation every query is scoped to.
    pub project_id: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

impl Settings {
    /// Load settings from `config/default.*`, then a local `tidepool.*`
    /// file, then `TIDEPOOL`-prefixed environment variables (e.g.
    /// `TIDEPOOL_UPSTREAM__API_TOKEN`), later sources winning.
    pub fn load() -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
            .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if Url::parse(&self.upstream.base_url).is_err() {
            return Err(SettingsError::invalid(format!(
                "upstream.base_url `{}` is not a valid URL",
                self.upstream.base_url
            )));
        }
        if self.upstream.api_token.trim().is_empty() {
            return Err(SettingsError::invalid("upstream.api_token must not be empty"));
        }
        if self.upstream.collection_id.trim().is_empty() {
            return Err(SettingsError::invalid(
                "upstream.collection_id must not be empty",
            ));
        }
        if self.upstream.project_id.trim().is_empty() {
            return Err(SettingsError::invalid("upstream.project_id must not be empty"));
        }
        if self.upstream.request_timeout_secs == 0 {
            return Err(SettingsError::invalid(
                "upstream.request_timeout_secs must be positive",
            ));
        }
        Ok(())
    }
}
