//! In-memory gateway that replays canned responses.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tr_protocol::{PipelineService, PipelineUpdateResponse, ProcessRequest};

use super::{validate_services, ByteStream, Gateway, GatewayError, GatewayResult};

/// A gateway whose pipeline and progress stream are fixed up front.
///
/// Stream chunks are replayed in order; an `Err` chunk breaks the stream
/// like a failed network read.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    services: Arc<Mutex<Vec<PipelineService>>>,
    chunks: Vec<Result<String, String>>,
    refuse_stream: Option<String>,
    submissions: Arc<Mutex<Vec<ProcessRequest>>>,
}

impl ScriptedGateway {
    pub fn new(services: Vec<PipelineService>) -> Self {
        Self {
            services: Arc::new(Mutex::new(services)),
            ..Default::default()
        }
    }

    /// Replay `chunks` as the body of every progress stream.
    pub fn with_stream<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(|c| Ok(c.into())).collect();
        self
    }

    /// Break the stream with `message` after the chunks replayed so far.
    pub fn with_read_failure(mut self, message: impl Into<String>) -> Self {
        self.chunks.push(Err(message.into()));
        self
    }

    /// Refuse to open a stream, answering with `detail`.
    pub fn refusing(mut self, detail: impl Into<String>) -> Self {
        self.refuse_stream = Some(detail.into());
        self
    }

    /// Requests submitted so far.
    pub fn submissions(&self) -> Vec<ProcessRequest> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn fetch_pipeline(&self) -> GatewayResult<Vec<PipelineService>> {
        self.services
            .lock()
            .map(|s| s.clone())
            .map_err(|e| GatewayError::Stream(e.to_string()))
    }

    async fn save_pipeline(
        &self,
        services: &[PipelineService],
    ) -> GatewayResult<PipelineUpdateResponse> {
        validate_services(services)?;
        let mut guard = self
            .services
            .lock()
            .map_err(|e| GatewayError::Stream(e.to_string()))?;
        *guard = services.to_vec();
        Ok(PipelineUpdateResponse {
            ok: true,
            saved: Some(false),
            detail: None,
        })
    }

    async fn open_stream(&self, request: &ProcessRequest) -> GatewayResult<ByteStream> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push(request.clone());
        }
        if let Some(detail) = &self.refuse_stream {
            return Err(GatewayError::Status {
                status: 400,
                detail: detail.clone(),
            });
        }
        let chunks: Vec<GatewayResult<Bytes>> = self
            .chunks
            .iter()
            .map(|chunk| match chunk {
                Ok(text) => Ok(Bytes::from(text.clone())),
                Err(message) => Err(GatewayError::Stream(message.clone())),
            })
            .collect();
        Ok(Box::pin(tokio_stream::iter(chunks)))
    }
}
