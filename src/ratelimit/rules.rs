//! Per-model limit table.
//!
//! This module handles loading the requests-per-window limits for each
//! canonical model key and resolving the limit that applies to a raw key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::model::{order_suffixes, ModelKey, DEFAULT_SUFFIXES};
use super::window::DEFAULT_WINDOW;
use crate::error::{GateError, Result};

/// Default limit for models without an explicit entry.
pub const DEFAULT_LIMIT: u64 = 5;

/// On-disk form of a limit table.
///
/// ```yaml
/// default_limit: 5
/// window_secs: 60
/// suffixes: ["-non-thinking", "-search", "-image"]
/// limits:
///   gemini-2.5-pro: 5
///   gemini-2.5-flash: 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitTableConfig {
    /// Limit applied to canonical keys missing from `limits`
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Length of the rolling window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Variant suffixes stripped before lookup
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
    /// Canonical key to requests per window
    #[serde(default)]
    pub limits: HashMap<String, u64>,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW.as_secs()
}

fn default_suffixes() -> Vec<String> {
    DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

/// Immutable mapping from canonical key to requests per window.
///
/// Built once at startup and shared read-only by the limiter.
#[derive(Debug, Clone)]
pub struct LimitTable {
    limits: HashMap<String, u64>,
    default_limit: u64,
    window: Duration,
    suffixes: Vec<String>,
}

impl LimitTable {
    /// Create an empty table that applies `default_limit` to every key.
    pub fn new(default_limit: u64) -> Self {
        Self {
            limits: HashMap::new(),
            default_limit,
            window: DEFAULT_WINDOW,
            suffixes: default_suffixes(),
        }
    }

    /// The built-in limits for the Gemini 2.5 family.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_LIMIT)
            .with_limit("gemini-2.5-pro", 5)
            .with_limit("gemini-2.5-flash", 10)
            .with_limit("gemini-2.5-flash-lite", 10)
    }

    /// Set the limit for a canonical key.
    pub fn with_limit(mut self, key: impl Into<String>, limit: u64) -> Self {
        self.limits.insert(key.into(), limit);
        self
    }

    /// Replace the default limit.
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Replace the rolling window length.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Replace the suffix list. Suffixes are reordered longest first.
    pub fn with_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = order_suffixes(suffixes.into_iter().map(Into::into).collect());
        self
    }

    /// Load a table from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model limit table");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load a table from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LimitTableConfig = serde_yaml::from_str(yaml)?;
        Self::from_config(config)
    }

    /// Build a table from its deserialized form.
    pub fn from_config(config: LimitTableConfig) -> Result<Self> {
        let table = Self {
            limits: config.limits,
            default_limit: config.default_limit,
            window: Duration::from_secs(config.window_secs),
            suffixes: order_suffixes(config.suffixes),
        };
        table.validate()?;
        Ok(table)
    }

    /// Reject unusable tables and flag degenerate ones.
    ///
    /// A zero limit is accepted: callers on that key wait forever.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(GateError::Config("window must be at least one second".to_string()));
        }

        if self.default_limit == 0 {
            warn!("Default limit is 0; unlisted models will never be admitted");
        }
        for (key, limit) in &self.limits {
            if *limit == 0 {
                warn!(key = %key, "Limit is 0; this model will never be admitted");
            }
        }
        Ok(())
    }

    /// Resolve the limit that applies to a raw key.
    pub fn resolve_limit(&self, key: &str) -> u64 {
        let canonical = ModelKey::canonical(key, self.suffixes.as_slice());
        self.limits
            .get(canonical.as_str())
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// Explicit limit for a canonical key, if configured.
    pub fn get(&self, canonical: &str) -> Option<u64> {
        self.limits.get(canonical).copied()
    }

    /// Limit used for keys without an explicit entry.
    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Suffixes in the order they are tried.
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Default for LimitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_limits() {
        let table = LimitTable::builtin();
        assert_eq!(table.resolve_limit("gemini-2.5-pro"), 5);
        assert_eq!(table.resolve_limit("gemini-2.5-flash"), 10);
        assert_eq!(table.resolve_limit("gemini-2.5-flash-lite"), 10);
        assert_eq!(table.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_suffixed_keys_share_base_limit() {
        let table = LimitTable::new(1).with_limit("gemini-2.5-pro", 7);
        let base = table.resolve_limit("gemini-2.5-pro");

        assert_eq!(base, 7);
        assert_eq!(table.resolve_limit("gemini-2.5-pro-search"), base);
        assert_eq!(table.resolve_limit("gemini-2.5-pro-image"), base);
        assert_eq!(table.resolve_limit("gemini-2.5-pro-non-thinking"), base);
    }

    #[test]
    fn test_unknown_key_uses_default() {
        let table = LimitTable::builtin().with_default_limit(3);
        assert_eq!(table.resolve_limit("some-other-model"), 3);
        assert_eq!(table.resolve_limit("some-other-model-search"), 3);
    }

    #[test]
    fn test_parse_yaml_table() {
        let yaml = r#"
default_limit: 2
window_secs: 30
limits:
  model-a: 4
  model-b: 0
"#;
        let table = LimitTable::from_yaml(yaml).unwrap();
        assert_eq!(table.default_limit(), 2);
        assert_eq!(table.window(), Duration::from_secs(30));
        assert_eq!(table.resolve_limit("model-a-image"), 4);
        assert_eq!(table.resolve_limit("model-b"), 0);
        assert_eq!(table.resolve_limit("model-c"), 2);
        assert_eq!(table.suffixes(), &["-non-thinking", "-search", "-image"]);
    }

    #[test]
    fn test_parse_yaml_defaults() {
        let table = LimitTable::from_yaml("limits: {}").unwrap();
        assert_eq!(table.default_limit(), DEFAULT_LIMIT);
        assert_eq!(table.window(), DEFAULT_WINDOW);
    }

    #[test]
    fn test_custom_suffixes_are_reordered() {
        let yaml = r#"
suffixes: ["-x", "-long-x"]
limits:
  base: 9
"#;
        let table = LimitTable::from_yaml(yaml).unwrap();
        assert_eq!(table.suffixes(), &["-long-x", "-x"]);
        assert_eq!(table.resolve_limit("base-long-x"), 9);
        assert_eq!(table.resolve_limit("base-x"), 9);
    }

    #[test]
    fn test_with_suffixes_replaces_defaults() {
        let table = LimitTable::new(1)
            .with_limit("base", 4)
            .with_suffixes(["-a", "-abc"]);
        assert_eq!(table.resolve_limit("base-abc"), 4);
        assert_eq!(table.resolve_limit("base-search"), 1);
        assert_eq!(table.get("base"), Some(4));
        assert_eq!(table.get("base-abc"), None);
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = LimitTable::from_yaml("window_secs: 0");
        assert!(matches!(result, Err(GateError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = LimitTable::from_yaml("limits: [1, 2");
        assert!(matches!(result, Err(GateError::Yaml(_))));
    }
}
