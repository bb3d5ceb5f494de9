//! Run execution engine.
//!
//! The RunEngine submits a request to the gateway, decodes the progress
//! stream into typed events, forwards them to the UI in order, and records
//! a summary of the finished run in the history ledger.

pub mod service;

use crate::gateway::Gateway;
use crate::history::RunHistoryStore;
use crate::stream::decode_frames;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tr_protocol::ipc::Event;
use tr_protocol::{ProcessRequest, ProgressEvent, RunRecord, RunStatus};
use uuid::Uuid;

pub use service::core_loop;

/// Message recorded when the stream ends without a terminal event.
pub const INCOMPLETE_RUN_MESSAGE: &str = "Stream ended before the run finished";

/// Outcome of one run as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,

    /// Summary appended to history; `None` if no trace id was ever seen.
    pub record: Option<RunRecord>,

    /// Transport failure that ended the run early, if any.
    pub failure: Option<String>,
}

/// Running totals for the active run, folded from its progress events.
#[derive(Debug)]
pub struct RunTally {
    trace_id: Option<String>,
    steps: usize,
    reported_steps: usize,
    first_error: Option<String>,
    finished: bool,
    started_at: Instant,
}

impl RunTally {
    pub fn new(started_at: Instant) -> Self {
        Self {
            trace_id: None,
            steps: 0,
            reported_steps: 0,
            first_error: None,
            finished: false,
            started_at,
        }
    }

    pub fn observe(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started(started) => self.note_trace(&started.trace_id),
            ProgressEvent::Step(_) => self.steps += 1,
            ProgressEvent::Error(error) => {
                if self.first_error.is_none() {
                    let service = non_blank(&error.service).unwrap_or("Service");
                    let text = non_blank(&error.error).unwrap_or("error");
                    self.first_error = Some(format!("{service}: {text}"));
                }
            }
            ProgressEvent::Done(done) => {
                self.note_trace(&done.trace_id);
                self.reported_steps = done.steps.as_ref().map_or(0, Vec::len);
                self.finished = true;
            }
            ProgressEvent::Other { .. } => {}
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Summarize the run. `None` when no trace id was seen.
    ///
    /// # Arguments
    ///
    /// * `finished_at_ms` - Epoch milliseconds of the end of the stream
    /// * `failure` - Transport failure that cut the stream short, if any
    pub fn into_record(self, finished_at_ms: i64, failure: Option<&str>) -> Option<RunRecord> {
        let trace_id = self.trace_id?;
        let error_message = self
            .first_error
            .or_else(|| failure.map(str::to_string))
            .or_else(|| (!self.finished).then(|| INCOMPLETE_RUN_MESSAGE.to_string()));
        let status = if error_message.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Ok
        };
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        Some(RunRecord::new(
            trace_id,
            finished_at_ms,
            status,
            self.steps.max(self.reported_steps),
            duration_ms,
            error_message,
        ))
    }

    fn note_trace(&mut self, trace_id: &str) {
        if !trace_id.is_empty() {
            self.trace_id = Some(trace_id.to_string());
        }
    }
}

/// Executes runs against a gateway and records them in history.
pub struct RunEngine {
    gateway: Arc<dyn Gateway>,
    history: Arc<Mutex<RunHistoryStore>>,
}

impl RunEngine {
    /// Create a new RunEngine.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Where runs are submitted
    /// * `history` - The ledger finished runs are appended to
    pub fn new(gateway: Arc<dyn Gateway>, history: Arc<Mutex<RunHistoryStore>>) -> Self {
        Self { gateway, history }
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn history(&self) -> &Arc<Mutex<RunHistoryStore>> {
        &self.history
    }

    /// Execute one run and return its summary.
    ///
    /// Emits `RunStarted` once the stream is open, one `Progress` per
    /// decoded frame in stream order, `HistoryChanged` when a record was
    /// appended, `RunFailed` on a transport failure, and finally
    /// `RunFinished`.
    ///
    /// # Arguments
    ///
    /// * `request` - The submission body
    /// * `events_tx` - Channel for sending events to the UI
    pub async fn run(&self, request: &ProcessRequest, events_tx: &Sender<Event>) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started_at = Instant::now();
        info!(%run_id, payload_type = %request.payload_type(), "submitting run");

        let stream = match self.gateway.open_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%run_id, error = %e, "failed to open progress stream");
                let message = e.to_string();
                let _ = events_tx
                    .send(Event::RunFailed {
                        run_id,
                        message: message.clone(),
                    })
                    .await;
                let _ = events_tx
                    .send(Event::RunFinished {
                        run_id,
                        record: None,
                    })
                    .await;
                return RunSummary {
                    run_id,
                    record: None,
                    failure: Some(message),
                };
            }
        };

        let _ = events_tx.send(Event::RunStarted { run_id }).await;

        let mut frames = decode_frames(stream);
        let mut tally = RunTally::new(started_at);
        let mut failure = None;

        while let Some(frame) = frames.next().await {
            match frame {
                Ok(frame) => {
                    let event = ProgressEvent::from_frame(&frame.event, frame.data);
                    debug!(%run_id, event = event.name(), "progress event");
                    tally.observe(&event);
                    let _ = events_tx.send(Event::Progress { run_id, event }).await;
                }
                Err(e) => {
                    warn!(%run_id, error = %e, "progress stream broke off");
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        let trace_id = tally.trace_id().map(str::to_string);
        let record = tally.into_record(Utc::now().timestamp_millis(), failure.as_deref());
        if let Some(record) = &record {
            let runs = {
                let mut history = self.history.lock().await;
                history.append(record.clone());
                history.runs().to_vec()
            };
            let _ = events_tx.send(Event::HistoryChanged { runs }).await;
        }

        if let Some(message) = &failure {
            let _ = events_tx
                .send(Event::RunFailed {
                    run_id,
                    message: message.clone(),
                })
                .await;
        }

        info!(
            %run_id,
            trace_id = trace_id.as_deref().unwrap_or("-"),
            status = record.as_ref().map_or("unrecorded", |r| r.status.as_str()),
            "run finished"
        );
        let _ = events_tx
            .send(Event::RunFinished {
                run_id,
                record: record.clone(),
            })
            .await;

        RunSummary {
            run_id,
            record,
            failure,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
