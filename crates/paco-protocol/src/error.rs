//! Error types for protocol operations

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status: {0}")]
    HttpStatus(StatusCode),

    #[error("Server error: {0}")]
    ServerError(StatusCode),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(#[from] paco_cache::CacheError),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("UTF-8 error")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ProtocolError {
    /// Whether the error came from the wire (network failure or HTTP status).
    ///
    /// Transport errors are never retried; they propagate to the caller of
    /// the single operation that issued the request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::HttpStatus(_)
                | Self::ServerError(_)
                | Self::RateLimited
                | Self::ServiceUnavailable
        )
    }

    /// Map a non-success HTTP status to an error
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::SERVICE_UNAVAILABLE => Self::ServiceUnavailable,
            status if status.is_server_error() => Self::ServerError(status),
            status => Self::HttpStatus(status),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
