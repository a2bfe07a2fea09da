//! Error taxonomy for the HTTP client.
//!
//! # Design Decisions
//! - `Transport` means no response was received; it never triggers a refresh
//! - `Status` carries the server's status, URL and body unmodified
//! - The enum is `Clone` so a shared (single-flight) refresh outcome can be
//!   handed to every waiter

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`HttpClient`](crate::http::HttpClient) operations.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// No response was received (DNS, connection refused, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        status: StatusCode,
        url: String,
        body: Value,
    },

    /// The path could not be resolved against the base URL.
    #[error("invalid URL '{path}': {reason}")]
    InvalidUrl { path: String, reason: String },

    /// The request could not be built (bad header, bad multipart part).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl HttpError {
    /// HTTP status of the failure, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// True for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True for failures that say the session itself is gone:
    /// 401, 403, or no response at all.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            HttpError::Transport(_) => true,
            HttpError::Status { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }

    /// Response body returned by the server, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            HttpError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        HttpError::Transport(Arc::new(e))
    }
}

/// Result type for HTTP client operations.
pub type HttpResult<T> = Result<T, HttpError>;
