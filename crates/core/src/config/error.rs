//! Error types for configuration loading.
//!
//! This module defines all errors that can occur while reading the client
//! configuration file and pipeline service definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config or service list file could not be read.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to parse a YAML (or JSON) service list.
    #[error("Failed to parse service list at {path}: {source}")]
    ServiceListParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A setting has a value the client cannot work with.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
