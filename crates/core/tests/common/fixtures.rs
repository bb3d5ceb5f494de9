//! Test fixtures for pipelines, stream bodies and history files.

use serde_json::{json, Value};
use tempfile::TempDir;
use tr_protocol::{PipelineService, RunRecord, RunStatus};

/// The four-service pipeline used throughout the tests.
#[allow(dead_code)]
pub fn sample_services() -> Vec<PipelineService> {
    ["validator", "transformer", "enricher", "persister"]
        .iter()
        .enumerate()
        .map(|(i, name)| PipelineService {
            name: name.to_string(),
            url: format!("http://{name}:800{}", i + 1),
            ..Default::default()
        })
        .collect()
}

/// `GET /api/pipeline` body for [`sample_services`].
#[allow(dead_code)]
pub fn sample_pipeline_body() -> Value {
    json!({ "services": sample_services() })
}

/// One encoded stream frame.
#[allow(dead_code)]
pub fn frame(event: &str, data: Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// Stream body of a run that succeeds through every sample service.
#[allow(dead_code)]
pub fn successful_run_body(trace_id: &str) -> String {
    let mut body = frame("started", json!({"trace_id": trace_id, "payload": {"text": "hi"}}));
    for service in ["validator", "transformer", "enricher", "persister"] {
        body.push_str(&frame(
            "step",
            json!({"service": service, "input": "hi", "output": "hi", "status": "ok", "payload_type": "text"}),
        ));
    }
    body.push_str(&frame(
        "done",
        json!({"trace_id": trace_id, "payload": {"type": "text", "data": "hi"}, "steps": [{}, {}, {}, {}]}),
    ));
    body
}

/// Stream body of a run whose enricher fails; the gateway then stops
/// without a terminal event.
#[allow(dead_code)]
pub fn failing_run_body(trace_id: &str) -> String {
    let mut body = frame("started", json!({"trace_id": trace_id, "payload": {}}));
    for service in ["validator", "transformer"] {
        body.push_str(&frame("step", json!({"service": service, "input": "a", "output": "b"})));
    }
    body.push_str(&frame("error", json!({"service": "enricher", "error": "timeout"})));
    body
}

/// A valid record for import fixtures.
#[allow(dead_code)]
pub fn sample_record(trace_id: &str) -> RunRecord {
    RunRecord::new(trace_id, 1_700_000_000_000, RunStatus::Ok, 4, 320, None)
}

/// A temporary directory holding `run-history.json`.
#[allow(dead_code)]
pub fn history_dir() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}
