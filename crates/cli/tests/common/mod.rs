//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

/// An isolated environment: its own config file and history file.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new(gateway_url: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            format!("gateway_url = \"{gateway_url}\"\nrequest_timeout_secs = 5\n"),
        )
        .unwrap();
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.path().join("run-history.json")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `tracerail --config <sandbox config>` with history in the sandbox.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tracerail").unwrap();
        cmd.arg("--config")
            .arg(self.config_path())
            .env("TRACERAIL_HISTORY_FILE", self.history_path())
            .env_remove("TRACERAIL_GATEWAY_URL")
            .env_remove("TRACERAIL_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    pub fn read_history(&self) -> Value {
        let text = std::fs::read_to_string(self.history_path()).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

pub fn record(trace_id: &str, status: &str) -> Value {
    json!({
        "traceId": trace_id,
        "timestamp": 1_700_000_000_000i64,
        "status": status,
        "stepsCount": 4,
        "durationMs": 250
    })
}

pub fn write_export(path: &Path, runs: Vec<Value>) {
    let document = json!({
        "version": 1,
        "exportedAt": "2024-01-01T00:00:00Z",
        "runs": runs
    });
    std::fs::write(path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
}

pub fn frame(event: &str, data: Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

pub fn pipeline_body() -> Value {
    json!({
        "services": [
            {"name": "validator", "url": "http://validator:8001", "icon": "✓"},
            {"name": "enricher", "url": "http://enricher:8003", "icon": "⊕"}
        ]
    })
}
