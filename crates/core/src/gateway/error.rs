//! Error types for gateway requests.

use thiserror::Error;

/// Errors that can occur while talking to the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request could not be sent or the response could not be read.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a failure. `detail` is its explanation.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    /// The request was rejected locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// The progress stream broke off mid-run.
    #[error("Stream interrupted: {0}")]
    Stream(String),
}

/// Type alias for Result with GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;
