//! Resolved client configuration.
//!
//! [`AppConfig`] is the outcome of layering defaults, the config file,
//! environment overrides and command-line flags.

use std::path::PathBuf;
use tr_protocol::config_models::ClientConfig;

/// Settings given on the command line. They win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file; replaces the platform default location.
    pub config_path: Option<PathBuf>,

    /// Gateway base URL.
    pub gateway_url: Option<String>,
}

/// Fully resolved configuration.
///
/// # Example
///
/// ```rust,no_run
/// use tr_core::config::loader::load_config;
/// use tr_core::config::models::ConfigOverrides;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(&ConfigOverrides::default())?;
/// println!("gateway at {}", config.client.gateway_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub client: ClientConfig,

    /// Config file that was read, if one existed.
    pub source: Option<PathBuf>,

    /// Where the run history ledger is persisted.
    pub history_path: PathBuf,
}

impl AppConfig {
    /// Defaults only, with history at `history_path`.
    pub fn with_history_path(history_path: impl Into<PathBuf>) -> Self {
        Self {
            client: ClientConfig::default(),
            source: None,
            history_path: history_path.into(),
        }
    }

    pub fn trace_link(&self, trace_id: &str) -> String {
        self.client.trace_link(trace_id)
    }
}
