//! Gateway client.
//!
//! The gateway owns the pipeline configuration and runs submissions through
//! the configured services, streaming progress back as text/event-stream.
//! [`Gateway`] is the seam the run engine talks through; [`HttpGateway`]
//! is the network implementation and [`ScriptedGateway`] replays canned
//! responses for tests.

pub mod error;
pub mod http;
pub mod scripted;

use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use tokio_stream::Stream;
use tr_protocol::{PipelineService, PipelineUpdateResponse, ProcessRequest};

pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;
pub use scripted::ScriptedGateway;

/// Raw body of a progress stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = GatewayResult<Bytes>> + Send>>;

/// Message shown when a save is attempted with no services.
pub const EMPTY_PIPELINE_MESSAGE: &str = "Add at least one microservice (name and URL required).";

/// Message shown when a service lacks a name or URL.
pub const INCOMPLETE_SERVICE_MESSAGE: &str = "Every service must have a name and URL.";

#[async_trait]
pub trait Gateway: Send + Sync {
    /// The ordered list of configured services.
    async fn fetch_pipeline(&self) -> GatewayResult<Vec<PipelineService>>;

    /// Replace the configured services.
    async fn save_pipeline(
        &self,
        services: &[PipelineService],
    ) -> GatewayResult<PipelineUpdateResponse>;

    /// Submit a run and open its progress stream.
    async fn open_stream(&self, request: &ProcessRequest) -> GatewayResult<ByteStream>;
}

/// Check a service list before it is sent.
///
/// # Errors
///
/// Returns `GatewayError::Validation` if the list is empty or any entry has
/// a blank name or URL.
pub fn validate_services(services: &[PipelineService]) -> GatewayResult<()> {
    if services.is_empty() {
        return Err(GatewayError::Validation(EMPTY_PIPELINE_MESSAGE.to_string()));
    }
    let incomplete = services
        .iter()
        .any(|s| s.name.trim().is_empty() || s.url.trim().is_empty());
    if incomplete {
        return Err(GatewayError::Validation(
            INCOMPLETE_SERVICE_MESSAGE.to_string(),
        ));
    }
    Ok(())
}

/// Services shown when the gateway cannot be reached or has none configured.
pub fn fallback_services() -> Vec<PipelineService> {
    [
        ("validator", "http://validator:8001", "✓"),
        ("transformer", "http://transformer:8002", "⇅"),
        ("enricher", "http://enricher:8003", "⊕"),
        ("persister", "http://persister:8004", "💾"),
    ]
    .into_iter()
    .map(|(name, url, icon)| PipelineService {
        name: name.to_string(),
        url: url.to_string(),
        icon: icon.to_string(),
        ..Default::default()
    })
    .collect()
}

/// User-facing summary of a successful save.
pub fn save_message(response: &PipelineUpdateResponse) -> String {
    if response.saved.unwrap_or(false) {
        "Pipeline saved. Config persisted to file.".to_string()
    } else {
        "Pipeline saved. (In-memory only for this gateway session.)".to_string()
    }
}
