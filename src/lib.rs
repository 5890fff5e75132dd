//! FlightVault Gateway Library
//!
//! Authorization and integrity-verification gateway sitting between the
//! off-chain artifact store and the on-chain commit/reveal settlement
//! contract for flight-prediction bounty batches.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (addresses, nonces, flights, submissions)
//! - [`crypto`] - Canonical digest engine and challenge signature verification
//! - [`auth`] - Nonce authority (challenge issuance and single-use consumption)
//! - [`chain`] - Read-only settlement contract state reader
//! - [`gateway`] - Authorization gateway orchestration and failure policy
//! - [`infra`] - Infrastructure implementations (PostgreSQL, object store)
//! - [`api`] - REST API routes
//! - [`server`] - HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod chain;
pub mod crypto;
pub mod domain;
pub mod gateway;
pub mod infra;
pub mod migrations;
pub mod server;

// Re-export commonly used types
pub use domain::{BatchIdHash, FlightSelectionEntry, NonceRecord, SubmissionRecord, WalletAddress};
pub use gateway::{ArtifactGrant, AuthorizationGateway};
pub use infra::{GatewayError, Result};
