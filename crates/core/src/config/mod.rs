//! Configuration loading and management.
//!
//! This module resolves the client configuration from defaults, the
//! `config.toml` file, environment variables and command-line flags, and
//! reads pipeline service lists from YAML or JSON files.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use models::{AppConfig, ConfigOverrides};
