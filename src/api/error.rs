//! API Error Types
//!
//! A single error type for every call made against the insights API.
//! Transport failures and non-success statuses are reported the same way
//! to the user: through the error's `Display` text.

use thiserror::Error;

/// Errors returned by [`ApiClient`](super::ApiClient)
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, reset)
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },

    /// The response body was not the JSON shape the caller asked for
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL and path did not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A caller-supplied header name or value was not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Body text verbatim, or `HTTP <status>` when the server sent nothing
fn status_message(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

impl ApiError {
    /// HTTP status for server-side failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
