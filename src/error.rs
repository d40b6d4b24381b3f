//! HTTP-facing error type with status code mapping.
//!
//! Expected scrape outcomes (nothing published yet, manual overrides,
//! exhausted retries) are reported in 200 bodies. [`ServiceError`] covers
//! malformed requests and failures that keep a handler from running.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "unknown game type: keno"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Not Found  | 404 Not Found             |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown game name in the path or query.
    #[error("unknown game type: {0}")]
    InvalidGame(String),

    /// Malformed or out-of-bounds date range.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// No stored draw for the game.
    #[error("no stored draw for {0}")]
    DrawNotFound(String),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidGame(_) => 1002,
            Self::InvalidRange(_) => 1003,
            Self::DrawNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidGame(_) | Self::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DrawNotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::domain::game::UnknownGame> for ServiceError {
    fn from(e: crate::domain::game::UnknownGame) -> Self {
        Self::InvalidGame(e.0)
    }
}

impl From<axum::extract::rejection::QueryRejection> for ServiceError {
    fn from(e: axum::extract::rejection::QueryRejection) -> Self {
        Self::InvalidRequest(e.body_text())
    }
}

impl From<crate::service::RangeError> for ServiceError {
    fn from(e: crate::service::RangeError) -> Self {
        Self::InvalidRange(e.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        let e = ServiceError::from(crate::domain::game::UnknownGame("keno".to_string()));
        assert_eq!(e.error_code(), 1002);
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "unknown game type: keno");
    }

    #[test]
    fn storage_errors_map_to_500() {
        let e = ServiceError::from(StoreError::Database("connection refused".to_string()));
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
