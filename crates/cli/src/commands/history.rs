//! `tracerail history list|export|import|clear`.

use std::io::Write;

use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use tr_core::config::models::AppConfig;
use tr_core::history::{FilePort, RunHistoryStore};
use tr_protocol::{RunRecord, RunStatus};

use crate::cli::HistoryCommand;

pub fn execute(config: &AppConfig, command: HistoryCommand) -> Result<()> {
    let mut store = RunHistoryStore::load(FilePort::new(&config.history_path));
    let mut out = std::io::stdout().lock();

    match command {
        HistoryCommand::List { limit } => write_runs(&mut out, store.runs(), limit)?,
        HistoryCommand::Export { output } => {
            let document = store.export()?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, document)
                        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
                    writeln!(
                        out,
                        "Exported {} run(s) to {}.",
                        store.len(),
                        path.display()
                    )?;
                }
                None => writeln!(out, "{document}")?,
            }
        }
        HistoryCommand::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let outcome = store.import(&text)?;
            writeln!(out, "{}", outcome.message)?;
        }
        HistoryCommand::Clear => {
            store.clear();
            writeln!(out, "Run history cleared.")?;
        }
    }
    Ok(())
}

/// Newest first, at most `limit` lines.
pub fn write_runs(out: &mut impl Write, runs: &[RunRecord], limit: usize) -> std::io::Result<()> {
    if runs.is_empty() {
        return writeln!(out, "{}", "No runs recorded.".dimmed());
    }
    for run in runs.iter().take(limit) {
        let finished = run
            .finished_at()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        let status = match run.status {
            RunStatus::Ok => "ok".green(),
            RunStatus::Error => "error".red(),
        };
        write!(
            out,
            "{finished}  {:<32}  {status:<5}  {:>3} step(s)  {:>6} ms",
            run.trace_id,
            run.steps(),
            run.duration()
        )?;
        match run.error_text() {
            Some(message) => writeln!(out, "  {}", message.red())?,
            None => writeln!(out)?,
        }
    }
    if runs.len() > limit {
        writeln!(out, "{}", format!("… {} more", runs.len() - limit).dimmed())?;
    }
    Ok(())
}
