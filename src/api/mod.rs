//! HTTP API surface of the gateway.

pub mod error;
pub mod handlers;
pub mod rest;

pub use error::{ApiError, ErrorCode};
