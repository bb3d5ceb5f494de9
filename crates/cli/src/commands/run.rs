//! `tracerail run`: one headless run, printed as it streams.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use tokio::sync::{mpsc, Mutex};
use tr_core::config::models::AppConfig;
use tr_core::engine::RunEngine;
use tr_core::gateway::{fallback_services, Gateway, HttpGateway};
use tr_core::history::{FilePort, RunHistoryStore};
use tr_core::state::RunState;
use tr_protocol::{
    ClientConfig, Event, PayloadType, PipelineService, ProcessRequest, ProgressEvent, RunRecord,
    RunStatus,
};
use tracing::warn;

use crate::cli::RunArgs;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub async fn execute(config: &AppConfig, args: RunArgs) -> Result<ExitCode> {
    let request = build_request(&args)?;
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::from_config(&config.client)?);
    let services = load_services(gateway.as_ref()).await;
    let history = RunHistoryStore::load(FilePort::new(&config.history_path));
    let engine = RunEngine::new(gateway, Arc::new(Mutex::new(history)));

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let submitted = request.clone();
    let run = tokio::spawn(async move { engine.run(&submitted, &events_tx).await });

    let mut reporter = Reporter::new(std::io::stdout().lock(), &config.client, &services, request);
    while let Some(event) = events_rx.recv().await {
        reporter.handle(&event)?;
    }

    let summary = run.await.wrap_err("run task failed")?;
    let ok = summary.failure.is_none()
        && summary
            .record
            .as_ref()
            .is_some_and(|record| record.status == RunStatus::Ok);
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Build the submission body from the command-line flags.
pub fn build_request(args: &RunArgs) -> Result<ProcessRequest> {
    if let Some(text) = &args.text {
        return Ok(ProcessRequest::text(text));
    }
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json).wrap_err("--json is not valid JSON")?;
        return Ok(ProcessRequest::typed(PayloadType::Json, json));
    }
    match (args.media_type, &args.data_file) {
        (Some(media_type), Some(path)) => media_request(media_type.into(), path),
        _ => Err(eyre!("one of --text, --json or --type with --data-file is required")),
    }
}

fn media_request(payload_type: PayloadType, path: &Path) -> Result<ProcessRequest> {
    let bytes =
        std::fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let mut metadata = serde_json::Map::new();
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        metadata.insert("filename".to_string(), name.into());
    }
    Ok(ProcessRequest::Typed {
        payload_type,
        data: BASE64.encode(bytes),
        metadata: Some(metadata),
    })
}

async fn load_services(gateway: &dyn Gateway) -> Vec<PipelineService> {
    match gateway.fetch_pipeline().await {
        Ok(services) if !services.is_empty() => services,
        Ok(_) => fallback_services(),
        Err(e) => {
            warn!(error = %e, "failed to fetch pipeline; using defaults");
            fallback_services()
        }
    }
}

/// Prints one line per event, projecting progress through a [`RunState`]
/// so previews match what the TUI shows.
pub struct Reporter<'a, W: Write> {
    out: W,
    config: &'a ClientConfig,
    state: RunState,
    request: ProcessRequest,
}

impl<'a, W: Write> Reporter<'a, W> {
    pub fn new(
        out: W,
        config: &'a ClientConfig,
        services: &[PipelineService],
        request: ProcessRequest,
    ) -> Self {
        Self {
            out,
            config,
            state: RunState::new(services, config.stations_per_row),
            request,
        }
    }

    pub fn handle(&mut self, event: &Event) -> std::io::Result<()> {
        match event {
            Event::RunStarted { .. } => {
                self.state.reset();
                self.state.on_submitted_locally(&self.request);
                let preview = self
                    .state
                    .stage(0)
                    .map(|view| view.output.to_string())
                    .unwrap_or_default();
                writeln!(self.out, "{} gateway  {}", "→".cyan(), preview.dimmed())
            }
            Event::Progress { event, .. } => {
                self.state.apply(event);
                self.progress_line(event)
            }
            Event::RunFailed { message, .. } => {
                writeln!(self.out, "{} {}", "✖".red().bold(), message.red())
            }
            Event::RunFinished { record, .. } => match record {
                Some(record) => self.summary(record),
                None => writeln!(self.out, "{}", "run not recorded".dimmed()),
            },
            _ => Ok(()),
        }
    }

    fn progress_line(&mut self, event: &ProgressEvent) -> std::io::Result<()> {
        match event {
            ProgressEvent::Started(started) => {
                writeln!(self.out, "{} started  trace {}", "●".cyan(), started.trace_id)
            }
            ProgressEvent::Step(step) => {
                let output = self
                    .state
                    .stage_by_id(&step.service)
                    .map(|view| view.output.to_string())
                    .unwrap_or_default();
                writeln!(
                    self.out,
                    "{} {}  {}",
                    "✔".green(),
                    step.service.green(),
                    output.dimmed()
                )
            }
            ProgressEvent::Error(error) => {
                writeln!(
                    self.out,
                    "{} {}: {}",
                    "✖".red(),
                    error.service.red(),
                    error.error
                )
            }
            ProgressEvent::Done(_) => {
                writeln!(self.out, "{} done", "■".cyan())?;
                if let Some(result) = self.state.result() {
                    for line in result.render().lines() {
                        writeln!(self.out, "  {line}")?;
                    }
                }
                Ok(())
            }
            ProgressEvent::Other { name, .. } => {
                writeln!(self.out, "{}", format!("· {name}").dimmed())
            }
        }
    }

    fn summary(&mut self, record: &RunRecord) -> std::io::Result<()> {
        let status = match record.status {
            RunStatus::Ok => "ok".green().bold(),
            RunStatus::Error => "error".red().bold(),
        };
        writeln!(
            self.out,
            "run {status} · {} step(s) · {} ms",
            record.steps(),
            record.duration()
        )?;
        if let Some(message) = record.error_text() {
            writeln!(self.out, "  {}", message.red())?;
        }
        writeln!(self.out, "trace: {}", self.config.trace_link(&record.trace_id))
    }
}
