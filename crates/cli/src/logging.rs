//! Tracing subscriber setup.
//!
//! The filter comes from `TRACERAIL_LOG` (same syntax as `RUST_LOG`).
//! Headless commands log to stderr so stdout stays clean for output. The
//! TUI owns the terminal, so its logs go to a file in the data directory.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TRACERAIL_LOG";
pub const LOG_FILE: &str = "tracerail.log";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log warnings and errors to stderr unless `TRACERAIL_LOG` says otherwise.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to `<dir>/tracerail.log`. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init_file(dir: &Path) -> Result<(WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("Failed to open {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("info"))
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok((guard, path))
}
