//! Stage models for the processing pipeline.
//!
//! A stage is one node on the rendered track. The configured pipeline
//! services become stages in order, and a synthetic ingress stage
//! (`gateway`) is always prepended.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pipeline_models::PipelineService;

/// Identifier of the synthetic ingress stage.
pub const GATEWAY_STAGE_ID: &str = "gateway";

/// Icon used when a configured service does not declare one.
pub const DEFAULT_STAGE_ICON: &str = "•";

/// One node in the ordered processing pipeline.
///
/// Identity is the lowercase `id`, unique within a configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Lowercase identifier used to match `step`/`error` events.
    pub id: String,

    /// Short glyph shown on the track.
    pub display_icon: String,

    /// Human-readable name.
    pub display_label: String,
}

impl Stage {
    /// The synthetic ingress stage representing the local submission.
    pub fn gateway() -> Self {
        Self {
            id: GATEWAY_STAGE_ID.to_string(),
            display_icon: "🚉".to_string(),
            display_label: "Gateway".to_string(),
        }
    }

    /// Build a stage from a configured pipeline service.
    pub fn from_service(service: &PipelineService) -> Self {
        let icon = service.icon.trim();
        Self {
            id: service.name.trim().to_lowercase(),
            display_icon: if icon.is_empty() {
                DEFAULT_STAGE_ICON.to_string()
            } else {
                icon.to_string()
            },
            display_label: service.name.clone(),
        }
    }

    /// Build the full stage sequence for a pipeline: gateway first, then
    /// every configured service in order.
    pub fn sequence_for(services: &[PipelineService]) -> Vec<Stage> {
        std::iter::once(Stage::gateway())
            .chain(services.iter().map(Stage::from_service))
            .collect()
    }

    /// Whether this is the synthetic ingress stage.
    pub fn is_gateway(&self) -> bool {
        self.id == GATEWAY_STAGE_ID
    }
}

/// Per-stage status within the active run.
///
/// Transitions are monotonic within a run:
/// `Idle -> Processing -> {Done | Error}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Initial and reset state.
    #[default]
    Idle,

    /// The stage is currently being executed downstream.
    Processing,

    /// The stage completed successfully.
    Done,

    /// The stage reported an error.
    Error,
}

impl StageStatus {
    /// `Done` and `Error` are terminal for the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, StageStatus::Done | StageStatus::Error)
    }

    /// Label shown next to the stage.
    pub fn label(self) -> &'static str {
        match self {
            StageStatus::Idle => "—",
            StageStatus::Processing => "Processing…",
            StageStatus::Done => "OK",
            StageStatus::Error => "Error",
        }
    }
}

/// Declared type of a payload travelling between stages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    Any,
    #[default]
    Text,
    Json,
    Image,
    Video,
    Binary,
}

impl PayloadType {
    /// All payload types in the order offered by pipeline editors.
    pub const ALL: [PayloadType; 6] = [
        PayloadType::Any,
        PayloadType::Text,
        PayloadType::Json,
        PayloadType::Image,
        PayloadType::Video,
        PayloadType::Binary,
    ];

    /// Lenient parse of a wire string. Unknown or empty values are `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => PayloadType::Any,
            "json" => PayloadType::Json,
            "image" => PayloadType::Image,
            "video" => PayloadType::Video,
            "binary" => PayloadType::Binary,
            _ => PayloadType::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PayloadType::Any => "any",
            PayloadType::Text => "text",
            PayloadType::Json => "json",
            PayloadType::Image => "image",
            PayloadType::Video => "video",
            PayloadType::Binary => "binary",
        }
    }

    /// Image and video payloads carry base64-encoded media.
    pub fn is_media(self) -> bool {
        matches!(self, PayloadType::Image | PayloadType::Video)
    }
}

impl std::fmt::Display for PayloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
