//! Error types for FlightVault gateway infrastructure

use thiserror::Error;

/// Errors that can occur in the gateway and its dependencies.
///
/// Every dependency failure is mapped to exactly one of these kinds at the
/// boundary where it is observed; nothing crosses the HTTP surface
/// untranslated.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Client input is syntactically malformed
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing/expired nonce or signature mismatch; the caller must
    /// restart the challenge protocol
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not entitled to the requested artifact
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Batch or submission does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient dependency failure (chain RPC, store, object store);
    /// safe for the caller to retry with backoff
    #[error("dependency unavailable: {0}")]
    ServiceUnavailable(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected decode/shape error; logged, surfaced generically
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
