use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Maximum body preview size carried in [`HttpError::UnexpectedStatus`] (8KB).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Executor error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Request body could not be serialized
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Single request attempt timed out
    #[error("Request attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation token fired before the request completed
    #[error("Request cancelled")]
    Cancelled,

    /// Transport error (network, connection, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Response status is not one of the statuses the request declared acceptable
    #[error("HTTP {status}: {body_preview}")]
    UnexpectedStatus {
        status: StatusCode,
        expected: Vec<StatusCode>,
        body_preview: String,
    },

    /// Invalid URL scheme for transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme {
        /// The URL scheme that was rejected
        scheme: String,
        /// Reason the scheme was rejected
        reason: String,
    },
}

impl HttpError {
    /// Build an `UnexpectedStatus` error, truncating the body to a preview.
    #[must_use]
    pub fn unexpected_status(status: StatusCode, expected: &[StatusCode], body: &[u8]) -> Self {
        let preview = &body[..body.len().min(ERROR_BODY_PREVIEW_LIMIT)];
        Self::UnexpectedStatus {
            status,
            expected: expected.to_vec(),
            body_preview: String::from_utf8_lossy(preview).into_owned(),
        }
    }

    /// Status code of an `UnexpectedStatus` error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
