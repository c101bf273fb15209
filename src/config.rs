//! Startup configuration read from the environment.
//!
//! Everything is validated up front; a missing credential or a malformed
//! value is fatal before any request is served.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::llm::{ProviderConfig, ProviderKind};
use crate::sink::{JsonlSink, RecordSink, SqliteSink};

pub const PROVIDER_VAR: &str = "LEADTRIAGE_PROVIDER";
pub const ENDPOINT_VAR: &str = "LEADTRIAGE_ENDPOINT";
pub const MODEL_VAR: &str = "LEADTRIAGE_MODEL";
pub const TEMPERATURE_VAR: &str = "LEADTRIAGE_TEMPERATURE";
pub const MAX_TOKENS_VAR: &str = "LEADTRIAGE_MAX_TOKENS";
pub const TIMEOUT_VAR: &str = "LEADTRIAGE_TIMEOUT_SECS";
pub const SINK_VAR: &str = "LEADTRIAGE_SINK";
pub const SINK_TIMEOUT_VAR: &str = "LEADTRIAGE_SINK_TIMEOUT_SECS";

/// Errors returned while loading configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Where classification records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Records are not stored
    Disabled,
    Jsonl(PathBuf),
    Sqlite(PathBuf),
}

impl FromStr for SinkConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(SinkConfig::Disabled);
        }
        match s.split_once(':') {
            Some(("jsonl", path)) if !path.is_empty() => Ok(SinkConfig::Jsonl(PathBuf::from(path))),
            Some(("sqlite", path)) if !path.is_empty() => Ok(SinkConfig::Sqlite(PathBuf::from(path))),
            _ => Err(format!(
                "expected none, jsonl:<path> or sqlite:<path>, got {s:?}"
            )),
        }
    }
}

impl SinkConfig {
    /// Open the configured sink; `None` when storage is disabled
    pub fn open(&self) -> anyhow::Result<Option<Arc<dyn RecordSink>>> {
        let sink: Arc<dyn RecordSink> = match self {
            SinkConfig::Disabled => {
                warn!("No record sink configured, classifications will not be stored");
                return Ok(None);
            }
            SinkConfig::Jsonl(path) => Arc::new(JsonlSink::new(path)?),
            SinkConfig::Sqlite(path) => Arc::new(SqliteSink::open(path)?),
        };
        Ok(Some(sink))
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub sink: SinkConfig,
    pub sink_timeout: Duration,
}

impl AppConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match get(PROVIDER_VAR) {
            Some(value) => parse_var(PROVIDER_VAR, &value)?,
            None => ProviderKind::OpenAi,
        };
        let api_key = get(kind.api_key_var()).ok_or(ConfigError::MissingVar(kind.api_key_var()))?;

        let mut provider = ProviderConfig::new(kind, api_key.trim());
        if let Some(endpoint) = get(ENDPOINT_VAR) {
            provider.endpoint = endpoint.trim().to_string();
        }
        if let Some(model) = get(MODEL_VAR) {
            provider.model = model.trim().to_string();
        }
        if let Some(value) = get(TEMPERATURE_VAR) {
            let temperature: f64 = parse_var(TEMPERATURE_VAR, &value)?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    var: TEMPERATURE_VAR,
                    message: format!("{temperature} is outside 0.0..=2.0"),
                });
            }
            provider.temperature = temperature;
        }
        if let Some(value) = get(MAX_TOKENS_VAR) {
            provider.max_tokens = parse_var(MAX_TOKENS_VAR, &value)?;
        }
        if let Some(value) = get(TIMEOUT_VAR) {
            provider.timeout = parse_secs(TIMEOUT_VAR, &value)?;
        }

        let sink = match get(SINK_VAR) {
            Some(value) => parse_var(SINK_VAR, &value)?,
            None => SinkConfig::Disabled,
        };
        let sink_timeout = match get(SINK_TIMEOUT_VAR) {
            Some(value) => parse_secs(SINK_TIMEOUT_VAR, &value)?,
            None => Duration::from_secs(10),
        };

        Ok(Self {
            provider,
            sink,
            sink_timeout,
        })
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        message: e.to_string(),
    })
}

fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_var(var, value)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            message: "timeout must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
