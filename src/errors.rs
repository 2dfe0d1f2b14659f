//!
//! src/errors.rs
//!
//! Defines the error enum shared by the fetch plumbing and the
//! normalization core, plus conversions from library errors
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("api error: status {status}: {}", .message.as_deref().unwrap_or("upstream failure"))]
    Status { status: u16, message: Option<String> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed record: missing `{field}`{}", .entity.as_deref().map(|e| format!(" in {e}")).unwrap_or_default())]
    Malformed {
        field: &'static str,
        entity: Option<String>,
    },
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Upstream HTTP status associated with the failure, when one exists.
    /// Unknown entity types map to 404 by upstream convention.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self { ApiError::Http(e.to_string()) }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self { ApiError::Parse(e.to_string()) }
}
