//! Pipeline configuration and submission models.
//!
//! These mirror the JSON shapes exchanged with the gateway:
//! `GET/PUT /api/pipeline` for the ordered service list and
//! `POST /process/stream` for a run submission.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::PayloadType;

/// One configured downstream service, as returned by `GET /api/pipeline`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct PipelineService {
    /// Service name; lowercased it becomes the stage id.
    pub name: String,

    /// Base URL the gateway posts to.
    pub url: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub input_type: String,

    #[serde(default)]
    pub output_type: String,
}

/// Response body of `GET /api/pipeline`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
pub struct PipelineResponse {
    #[serde(default)]
    pub services: Vec<PipelineService>,
}

/// One entry of a `PUT /api/pipeline` body.
///
/// Payload types serialize as `null` when unset so the gateway keeps its
/// own default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PipelineServiceUpdate {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub output_type: Option<String>,
}

impl From<&PipelineService> for PipelineServiceUpdate {
    fn from(service: &PipelineService) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            name: service.name.clone(),
            url: service.url.clone(),
            icon: service.icon.clone(),
            description: service.description.clone(),
            input_type: non_empty(&service.input_type),
            output_type: non_empty(&service.output_type),
        }
    }
}

/// Body of `PUT /api/pipeline`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct PipelineUpdateRequest {
    pub services: Vec<PipelineServiceUpdate>,
}

/// Response of `PUT /api/pipeline`.
///
/// `saved: false` (or absent) means the configuration was applied in memory
/// only for the gateway's current session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct PipelineUpdateResponse {
    pub ok: bool,
    #[serde(default)]
    pub saved: Option<bool>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// A run submission body for `POST /process/stream`.
///
/// ```json
/// { "text": "hello" }
/// { "type": "json", "data": "{\"a\":1}", "metadata": {} }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(untagged)]
pub enum ProcessRequest {
    /// Typed payload; `data` is raw text for `json`, base64 for media and binary.
    Typed {
        #[serde(rename = "type")]
        payload_type: PayloadType,
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(type = "Record<string, unknown> | null")]
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    },

    /// Plain text submission.
    Text { text: String },
}

impl ProcessRequest {
    pub fn text(text: impl Into<String>) -> Self {
        ProcessRequest::Text { text: text.into() }
    }

    pub fn typed(payload_type: PayloadType, data: impl Into<String>) -> Self {
        ProcessRequest::Typed {
            payload_type,
            data: data.into(),
            metadata: Some(serde_json::Map::new()),
        }
    }

    /// Declared type of the submitted payload.
    pub fn payload_type(&self) -> PayloadType {
        match self {
            ProcessRequest::Typed { payload_type, .. } => *payload_type,
            ProcessRequest::Text { .. } => PayloadType::Text,
        }
    }

    /// The value echoed as the gateway stage's preview.
    pub fn preview_value(&self) -> &str {
        match self {
            ProcessRequest::Typed { data, .. } => data,
            ProcessRequest::Text { text } => text,
        }
    }
}
