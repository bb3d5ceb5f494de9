//! Client configuration models for `config.toml`.
//!
//! This module defines the settings that control where the client finds
//! the gateway, how the track is laid out and where run history lives.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Default gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8080";

/// Default trace viewer base URL.
pub const DEFAULT_TRACE_VIEWER_URL: &str = "http://localhost:16686";

/// Default number of stations drawn per track row.
pub const DEFAULT_STATIONS_PER_ROW: usize = 5;

/// Represents client settings from `config.toml`.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Example
///
/// ```toml
/// gateway_url = "http://gateway.internal:8080"
/// stations_per_row = 4
/// history_file = "/var/lib/tracerail/history.json"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the gateway serving `/api/pipeline` and `/process/stream`.
    pub gateway_url: String,

    /// Number of stations per track row before the track wraps.
    pub stations_per_row: usize,

    /// Location of the persisted run history. Falls back to the platform
    /// data directory when unset.
    pub history_file: Option<PathBuf>,

    /// Base URL of the trace viewer used for trace links.
    pub trace_viewer_url: String,

    /// Timeout applied to gateway requests, including the whole stream.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            stations_per_row: DEFAULT_STATIONS_PER_ROW,
            history_file: None,
            trace_viewer_url: DEFAULT_TRACE_VIEWER_URL.to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    /// Link to a trace in the configured trace viewer.
    pub fn trace_link(&self, trace_id: &str) -> String {
        format!(
            "{}/trace/{}",
            self.trace_viewer_url.trim_end_matches('/'),
            trace_id
        )
    }
}
