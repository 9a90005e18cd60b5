//! Error types for Modelgate.
//!
//! Admission itself never fails; these errors only surface while loading
//! configuration and limit tables.

use thiserror::Error;

/// Main error type for Modelgate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Layered settings could not be assembled
    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    /// Limit table could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Modelgate operations.
pub type Result<T> = std::result::Result<T, GateError>;
