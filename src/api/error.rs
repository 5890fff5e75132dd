//! Structured API error responses with error codes
//!
//! Every failure leaving the gateway is one of a small, stable set of
//! machine-readable codes with a short human-readable message. Nothing
//! internal leaks past the boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::GatewayError;

/// Error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic
/// error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// Bad/missing/expired nonce or signature mismatch; restart the
    /// challenge protocol
    ChallengeFailed,
    /// Authenticated but not entitled to the requested artifact
    AccessDenied,

    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,

    // Resource errors (4xxx)
    /// Batch or submission not found
    ResourceNotFound,

    // Infrastructure errors (8xxx)
    /// Database operation failed
    DatabaseError,
    /// Chain RPC or object store unavailable; safe to retry with backoff
    ServiceUnavailable,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::ChallengeFailed => 1001,
            ErrorCode::AccessDenied => 1002,
            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::DatabaseError => 8001,
            ErrorCode::ServiceUnavailable => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ChallengeFailed => StatusCode::UNAUTHORIZED,
            ErrorCode::AccessDenied => StatusCode::FORBIDDEN,
            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::ChallengeFailed => "CHALLENGE_FAILED",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

/// Structured error response for API endpoints.
///
/// Always carries `ok: false` so every response has an explicit success
/// flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub ok: bool,
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
            },
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::BadRequest(msg) => ApiError::new(ErrorCode::InvalidRequestBody, msg),
            GatewayError::Unauthenticated(msg) => ApiError::new(ErrorCode::ChallengeFailed, msg),
            GatewayError::Forbidden(msg) => ApiError::new(ErrorCode::AccessDenied, msg),
            GatewayError::NotFound(msg) => ApiError::new(ErrorCode::ResourceNotFound, msg),
            GatewayError::ServiceUnavailable(msg) => {
                ApiError::new(ErrorCode::ServiceUnavailable, msg)
            }
            GatewayError::Database(e) => {
                // Detail goes to the log, not the caller.
                tracing::error!(error = %e, "database error");
                ApiError::new(ErrorCode::DatabaseError, "database operation failed")
            }
            GatewayError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                ApiError::new(ErrorCode::InternalError, "internal error")
            }
        }
    }
}
