//! Error types for the backend layer.

use thiserror::Error;

/// Errors that can occur while talking to an extraction backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// API key missing or rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request quota or rate limit exhausted.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure (DNS, TLS, connection reset...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply was well-formed but carried no generated text.
    #[error("backend reply contained no text")]
    EmptyReply,

    /// The reply body could not be decoded.
    #[error("failed to decode backend reply: {0}")]
    Decode(String),
}

impl BackendError {
    /// Map an HTTP status code and body to the matching error kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Auth(body),
            429 => Self::Quota(body),
            _ => Self::Status { status, body },
        }
    }
}
