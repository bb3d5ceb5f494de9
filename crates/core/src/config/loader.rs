//! Configuration loader.
//!
//! Layers, lowest to highest precedence:
//! - built-in defaults
//! - `config.toml` in the platform config directory (or `--config`)
//! - `TRACERAIL_GATEWAY_URL` and `TRACERAIL_HISTORY_FILE`
//! - command-line flags

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, ConfigOverrides};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tr_protocol::config_models::ClientConfig;
use tr_protocol::pipeline_models::{PipelineResponse, PipelineService};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "tracerail";

/// File name of the client configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// File name of the persisted run history.
pub const HISTORY_FILE: &str = "run-history.json";

/// Environment variable overriding the gateway URL.
pub const ENV_GATEWAY_URL: &str = "TRACERAIL_GATEWAY_URL";

/// Environment variable overriding the history file location.
pub const ENV_HISTORY_FILE: &str = "TRACERAIL_HISTORY_FILE";

/// Platform location of `config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Platform data directory for tracerail, falling back to `./.tracerail`.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".tracerail"))
}

/// Default location of the run history ledger.
pub fn default_history_path() -> PathBuf {
    data_dir().join(HISTORY_FILE)
}

/// Loads configuration from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the config file exists but cannot be read or
/// parsed, or if a resolved value is invalid.
pub fn load_config(overrides: &ConfigOverrides) -> ConfigResult<AppConfig> {
    load_config_with_env(overrides, |key| std::env::var(key).ok())
}

/// Loads configuration with an injected environment lookup.
///
/// # Arguments
///
/// * `overrides` - Command-line settings
/// * `env` - Returns the value of an environment variable, if set
pub fn load_config_with_env<F>(overrides: &ConfigOverrides, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let path = overrides.config_path.clone().or_else(default_config_path);

    let (mut client, source) = match path {
        Some(path) if path.exists() => (load_client_config(&path)?, Some(path)),
        Some(path) if overrides.config_path.is_some() => {
            // An explicitly named file must exist.
            return Err(ConfigError::FileRead {
                path,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        _ => (ClientConfig::default(), None),
    };

    if let Some(url) = env(ENV_GATEWAY_URL).filter(|v| !v.trim().is_empty()) {
        client.gateway_url = url;
    }
    if let Some(file) = env(ENV_HISTORY_FILE).filter(|v| !v.trim().is_empty()) {
        client.history_file = Some(PathBuf::from(file));
    }
    if let Some(url) = &overrides.gateway_url {
        client.gateway_url = url.clone();
    }

    client.gateway_url = client.gateway_url.trim().trim_end_matches('/').to_string();
    validate(&client)?;

    let history_path = client
        .history_file
        .clone()
        .unwrap_or_else(default_history_path);

    Ok(AppConfig {
        client,
        source,
        history_path,
    })
}

/// Reads `config.toml` at `path`. A missing file yields defaults.
pub fn load_client_config(path: &Path) -> ConfigResult<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(client: &ClientConfig) -> ConfigResult<()> {
    if client.stations_per_row == 0 {
        return Err(ConfigError::InvalidValue {
            field: "stations_per_row",
            reason: "must be at least 1".to_string(),
        });
    }
    if client.gateway_url.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "gateway_url",
            reason: "must not be empty".to_string(),
        });
    }
    if client.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "request_timeout_secs",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// A service list file: either a bare list or `{ services: [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ServicesDocument {
    List(Vec<PipelineService>),
    Wrapped(PipelineResponse),
}

/// Loads a pipeline service list from a YAML or JSON file.
pub fn load_services_file(path: &Path) -> ConfigResult<Vec<PipelineService>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let document: ServicesDocument =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ServiceListParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(match document {
        ServicesDocument::List(services) => services,
        ServicesDocument::Wrapped(response) => response.services,
    })
}
