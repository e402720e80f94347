use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The cache store cannot be reached. Only administrative callers see this.
    #[error("Cache store unavailable")]
    StoreUnavailable,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => AppError::StoreUnavailable,
            StoreError::Redis(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::StoreUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "Redis not connected".to_string())
            }
            AppError::Upstream(e) => (e.status_code(), e.to_string()),
            AppError::Signal(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::Reqwest(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::SerdeJson(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Anyhow(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Failure reported by an upstream market data provider.
///
/// Cloneable so that every caller sharing one in-flight fetch receives the
/// same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Status(u16),

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            UpstreamError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
            UpstreamError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::InvalidResponse(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

/// Errors from the backing key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable")]
    Unavailable,

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

impl StoreError {
    /// Whether the error means the connection itself is gone.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            StoreError::Unavailable => true,
            StoreError::Redis(e) => {
                e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error()
            }
        }
    }
}

/// Precondition failures of the composite signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("input length mismatch: {field} has {actual} points, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_codes() {
        assert_eq!(
            UpstreamError::RateLimited("yahoo".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            UpstreamError::SymbolNotFound("ZZZZ".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(UpstreamError::Status(500).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let response = AppError::from(StoreError::Unavailable).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unavailable_is_connection_loss() {
        assert!(StoreError::Unavailable.is_connection_loss());
    }
}
