//! Configuration management for Modelgate.
//!
//! Settings are layered with the `config` crate: an optional YAML file first,
//! then `MODELGATE__*` environment variables (`__` separates nested keys, e.g.
//! `MODELGATE__RATE_LIMITING__DEFAULT_LIMIT=3`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::ratelimit::LimitTable;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MODELGATE";

/// Main configuration for Modelgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Path to a YAML limit table; the built-in table is used when unset
    pub config_path: Option<String>,

    /// Override for the table's default limit
    pub default_limit: Option<u64>,

    /// Override for the table's window length in seconds
    pub window_secs: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `modelgate=debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl GateConfig {
    /// Load configuration from an optional file plus the process environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load configuration, reading environment overrides from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(path: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(env),
        );

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Build the limit table described by this configuration.
    pub fn limit_table(&self) -> Result<LimitTable> {
        let rate_limiting = &self.rate_limiting;

        let mut table = match &rate_limiting.config_path {
            Some(path) => LimitTable::from_file(path)?,
            None => LimitTable::builtin(),
        };

        if let Some(limit) = rate_limiting.default_limit {
            table = table.with_default_limit(limit);
        }
        if let Some(secs) = rate_limiting.window_secs {
            table = table.with_window(Duration::from_secs(secs));
        }

        table.validate()?;
        Ok(table)
    }
}
