//! Renderable result of a finished run.

use serde_json::{json, Value};
use tr_protocol::{DoneData, PayloadType};

/// What the terminal `done` event carried back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    /// The final payload produced by the last stage.
    Payload(Value),

    /// No payload; the step list and storage receipt instead.
    Steps { steps: Vec<Value>, stored: Option<Value> },
}

impl RunResult {
    /// Pick the renderable result of a `done` event, if any.
    ///
    /// A non-null payload wins over the step list.
    pub fn from_done(done: &DoneData) -> Option<Self> {
        match (&done.payload, &done.steps) {
            (Some(payload), _) if !payload.is_null() => Some(RunResult::Payload(payload.clone())),
            (_, Some(steps)) => Some(RunResult::Steps {
                steps: steps.clone(),
                stored: done.stored.clone(),
            }),
            _ => None,
        }
    }

    /// Text rendering of the result.
    pub fn render(&self) -> String {
        match self {
            RunResult::Steps { steps, stored } => pretty(&json!({ "steps": steps, "stored": stored })),
            RunResult::Payload(payload) => render_payload(payload),
        }
    }
}

fn render_payload(payload: &Value) -> String {
    let kind = payload
        .get("type")
        .and_then(Value::as_str)
        .map(PayloadType::parse)
        .unwrap_or_default();
    let data = payload.get("data");
    let text = data.and_then(Value::as_str);

    match kind {
        PayloadType::Image | PayloadType::Video if text.is_some_and(|t| !t.is_empty()) => {
            let length = text.map(|t| t.chars().count()).unwrap_or_default();
            format!("[{kind}] {length} chars base64")
        }
        PayloadType::Json => match text {
            Some(raw) => serde_json::from_str::<Value>(raw)
                .map(|parsed| pretty(&parsed))
                .unwrap_or_else(|_| raw.to_string()),
            None => data.map(pretty).unwrap_or_default(),
        },
        PayloadType::Binary => {
            let filename = payload
                .pointer("/metadata/filename")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty());
            match filename {
                Some(name) => {
                    let length = text.map(|t| t.chars().count()).unwrap_or_default();
                    format!("Download: {name} ({length} chars base64)")
                }
                None => fallback(payload, data),
            }
        }
        _ => fallback(payload, data),
    }
}

fn fallback(payload: &Value, data: Option<&Value>) -> String {
    match data {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => pretty(&json!({ "payload": payload })),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
