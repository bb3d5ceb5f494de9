//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the TUI (user interface) and the Core (gateway I/O, decoding and
//! history persistence).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from TUI to Core
//! - `Event`: Status updates sent from Core to TUI

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

use crate::event_models::ProgressEvent;
use crate::history_models::RunRecord;
use crate::pipeline_models::{PipelineService, ProcessRequest};

/// Operations sent from the UI (TUI) to the Core logic.
///
/// ```json
/// { "type": "submit", "payload": { "request": { "text": "hello" } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Submit a request and stream its progress.
    ///
    /// Refused while another run is in flight.
    Submit { request: ProcessRequest },

    /// Fetch the pipeline configuration again.
    ReloadPipeline,

    /// Replace the pipeline configuration.
    SavePipeline { services: Vec<PipelineService> },

    /// Write the run history export document to a file.
    ExportHistory { path: PathBuf },

    /// Merge runs from an export document on disk.
    ImportHistory { path: PathBuf },

    /// Drop every persisted run.
    ClearHistory,

    /// Shut down the core loop.
    Shutdown,
}

/// Events sent from the Core logic to the UI (TUI).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The pipeline configuration was (re)loaded.
    PipelineLoaded { services: Vec<PipelineService> },

    /// A configuration save was accepted; `persisted` is false when the
    /// gateway only applied it in memory.
    PipelineSaved { persisted: bool },

    /// A run was submitted and its stream opened.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// A decoded progress event for the active run, in stream order.
    Progress {
        #[ts(type = "string")]
        run_id: Uuid,
        event: ProgressEvent,
    },

    /// The run could not be started or its stream broke.
    RunFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        message: String,
    },

    /// The stream ended. `record` is the summary appended to history, if any.
    RunFinished {
        #[ts(type = "string")]
        run_id: Uuid,
        record: Option<RunRecord>,
    },

    /// The run history changed; carries the full newest-first ledger.
    HistoryChanged { runs: Vec<RunRecord> },

    /// Advisory text for the user.
    Notice { message: String },

    /// A user-visible failure that did not belong to a run.
    Failure { message: String },
}
