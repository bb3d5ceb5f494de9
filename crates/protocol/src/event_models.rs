//! Progress events streamed by the gateway during a run.
//!
//! The gateway emits text-event-stream frames of the form
//! `event: <name>\ndata: <json>\n\n`. A decoded frame is turned into a
//! [`ProgressEvent`] with [`ProgressEvent::from_frame`]. Events for one run
//! arrive in the order `started`, zero or more `step`/`error`, then `done`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::stage_models::PayloadType;

/// Payload of a `started` event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct StartedData {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub payload: Value,
}

/// Payload of a `step` event: one stage finished.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct StepData {
    /// Name of the service that finished; matched case-insensitively.
    #[serde(default)]
    pub service: String,
    /// Usually a string; any JSON value is accepted.
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payload_type: Option<String>,
}

impl StepData {
    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
            .as_deref()
            .map(PayloadType::parse)
            .unwrap_or_default()
    }

    /// `input` as preview text.
    pub fn input_text(&self) -> Option<String> {
        self.input.as_ref().and_then(value_text)
    }

    /// `output` as preview text.
    pub fn output_text(&self) -> Option<String> {
        self.output.as_ref().and_then(value_text)
    }
}

/// Strings as-is, `null` as absent, anything else as compact JSON.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Payload of an `error` event: one stage failed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct ErrorData {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub error: String,
}

/// Payload of the terminal `done` event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct DoneData {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<Value>,
}

impl DoneData {
    /// A run has a renderable result when a payload or a step list arrived.
    pub fn has_result(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| !p.is_null()) || self.steps.is_some()
    }
}

/// A typed progress notification for the active run.
///
/// Serialized as `{ "event": <name>, "data": { ... } }`, the same pairing a
/// stream frame carries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ProgressEvent {
    Started(StartedData),
    Step(StepData),
    Error(ErrorData),
    Done(DoneData),
    /// An event name the client does not act on.
    Other { name: String, data: Value },
}

impl ProgressEvent {
    /// Build a typed event from a decoded frame.
    ///
    /// Never fails: a payload whose shape does not match the event name
    /// (for instance a bare string) yields the event with default fields,
    /// and an unknown event name yields [`ProgressEvent::Other`].
    pub fn from_frame(name: &str, data: Value) -> Self {
        fn shaped<T: serde::de::DeserializeOwned + Default>(data: &Value) -> T {
            serde_json::from_value(data.clone()).unwrap_or_default()
        }

        match name {
            "started" => ProgressEvent::Started(shaped(&data)),
            "step" => ProgressEvent::Step(shaped(&data)),
            "error" => {
                let mut error: ErrorData = shaped(&data);
                if let Value::String(text) = &data {
                    error.error = text.clone();
                }
                ProgressEvent::Error(error)
            }
            "done" => ProgressEvent::Done(shaped(&data)),
            other => ProgressEvent::Other {
                name: other.to_string(),
                data,
            },
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            ProgressEvent::Started(_) => "started",
            ProgressEvent::Step(_) => "step",
            ProgressEvent::Error(_) => "error",
            ProgressEvent::Done(_) => "done",
            ProgressEvent::Other { name, .. } => name,
        }
    }

    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Done(_))
    }
}
