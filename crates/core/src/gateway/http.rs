//! Gateway client over HTTP.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use tr_protocol::{
    ClientConfig, PipelineResponse, PipelineService, PipelineServiceUpdate,
    PipelineUpdateRequest, PipelineUpdateResponse, ProcessRequest,
};

use super::{validate_services, ByteStream, Gateway, GatewayError, GatewayResult};

pub struct HttpGateway {
    base_url: String,
    http_client: Client,
}

impl HttpGateway {
    /// Create a client for the gateway at `base_url`.
    ///
    /// `timeout` bounds every request, including reading a whole progress
    /// stream.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> GatewayResult<Self> {
        Self::new(
            config.gateway_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_pipeline(&self) -> GatewayResult<Vec<PipelineService>> {
        let response = self.http_client.get(self.url("/api/pipeline")).send().await?;
        let response = ensure_success(response).await?;
        let body: PipelineResponse = response.json().await?;
        debug!(services = body.services.len(), "fetched pipeline");
        Ok(body.services)
    }

    async fn save_pipeline(
        &self,
        services: &[PipelineService],
    ) -> GatewayResult<PipelineUpdateResponse> {
        validate_services(services)?;

        let body = PipelineUpdateRequest {
            services: services.iter().map(PipelineServiceUpdate::from).collect(),
        };
        let response = self
            .http_client
            .put(self.url("/api/pipeline"))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let reply: PipelineUpdateResponse = response.json().await?;

        if !reply.ok {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                detail: reply
                    .detail
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "Save failed".to_string()),
            });
        }
        Ok(reply)
    }

    async fn open_stream(&self, request: &ProcessRequest) -> GatewayResult<ByteStream> {
        let response = self
            .http_client
            .post(self.url("/process/stream"))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                warn!(error = %e, "progress stream read failed");
                GatewayError::Stream(e.to_string())
            })
        });
        Ok(Box::pin(stream))
    }
}

/// Turn a non-2xx response into `GatewayError::Status`.
async fn ensure_success(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or("Request failed").to_string();
    let detail = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| detail_text(&body))
        .unwrap_or(reason);
    Err(GatewayError::Status {
        status: status.as_u16(),
        detail,
    })
}

/// `detail` as a string, or an array of parts joined with spaces.
fn detail_text(body: &Value) -> Option<String> {
    let text = match body.get("detail")? {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
