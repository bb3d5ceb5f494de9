//! Run history models.
//!
//! A [`RunRecord`] summarizes one finished run. Records are kept in a
//! newest-first ledger and exported as a [`HistoryExport`] document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use ts_rs::TS;

/// Maximum number of records kept in the ledger.
pub const MAX_RUN_HISTORY: usize = 500;

/// Version tag written into export documents.
pub const HISTORY_EXPORT_VERSION: u32 = 1;

/// Outcome of a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Ok => "ok",
            RunStatus::Error => "error",
        }
    }
}

/// Summary of one finished run. Immutable once created.
///
/// ```json
/// { "traceId": "4bf9...", "timestamp": 1718000000000, "status": "ok",
///   "stepsCount": 4, "durationMs": 812 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub trace_id: String,

    /// Epoch milliseconds when the run finished.
    #[ts(type = "number")]
    pub timestamp: Number,

    pub status: RunStatus,

    #[ts(type = "number")]
    pub steps_count: Number,

    #[ts(type = "number")]
    pub duration_ms: Number,

    /// Free-form; any JSON value is accepted on import. An explicit
    /// `null` is kept as `Some(Value::Null)` so it survives a re-export.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<Value>,
}

impl RunRecord {
    /// Whether a JSON value is a well-typed record.
    ///
    /// Valid iff it is an object with `traceId` a string, `timestamp` a
    /// number, `status` exactly `"ok"` or `"error"`, `stepsCount` a number
    /// and `durationMs` a number. `errorMessage` is unconstrained.
    pub fn is_valid_value(value: &Value) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };
        let is_number = |key: &str| object.get(key).is_some_and(Value::is_number);
        object.get("traceId").is_some_and(Value::is_string)
            && is_number("timestamp")
            && matches!(
                object.get("status").and_then(Value::as_str),
                Some("ok") | Some("error")
            )
            && is_number("stepsCount")
            && is_number("durationMs")
    }

    /// Build a record for a run that just finished.
    pub fn new(
        trace_id: impl Into<String>,
        timestamp_ms: i64,
        status: RunStatus,
        steps_count: usize,
        duration_ms: u64,
        error_message: Option<String>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            timestamp: Number::from(timestamp_ms),
            status,
            steps_count: Number::from(steps_count),
            duration_ms: Number::from(duration_ms),
            error_message: error_message.map(Value::String),
        }
    }

    /// Decode a value only if it passes [`RunRecord::is_valid_value`].
    pub fn from_valid_value(value: &Value) -> Option<Self> {
        if !Self::is_valid_value(value) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Error message as display text, if any.
    pub fn error_text(&self) -> Option<String> {
        match self.error_message.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Finish time as a UTC datetime, when representable.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(number_as_i64(&self.timestamp)?)
    }

    pub fn steps(&self) -> i64 {
        number_as_i64(&self.steps_count).unwrap_or_default()
    }

    pub fn duration(&self) -> i64 {
        number_as_i64(&self.duration_ms).unwrap_or_default()
    }
}

/// A field that is present deserializes to `Some`, even when it is `null`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn number_as_i64(number: &Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|f| f.round() as i64))
}

/// Export/import document.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub runs: Vec<RunRecord>,
}

/// Result of a successful import.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ImportOutcome {
    pub imported: usize,
    pub message: String,
}
