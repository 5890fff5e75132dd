//! Trait definitions for the gateway's external collaborators.
//!
//! The gateway owns no state of its own; these seams cover everything it
//! reads or mutates. Each one is mockable for orchestration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::domain::{BatchIdHash, FlightSelectionEntry, NonceRecord, SubmissionRecord, WalletAddress};

use super::Result;

/// Keyed record store for single-use challenge nonces.
///
/// Invariant: one live record per address. Consumption must be atomic with
/// deletion so that concurrent callers race to a single winner.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Insert or overwrite the nonce record for an address.
    async fn upsert(&self, record: &NonceRecord) -> Result<()>;

    /// Atomically delete and return the current record for an address.
    ///
    /// Returns `None` when no record exists (including when another caller
    /// won the race). Expiry is judged by the caller; the row is gone
    /// either way.
    async fn consume(&self, address: &WalletAddress) -> Result<Option<NonceRecord>>;
}

/// Store of provider submission pointers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Record a new submission row.
    async fn insert(&self, record: &SubmissionRecord) -> Result<()>;

    /// Most recently created submission for (batch, provider), if any.
    async fn find_latest(
        &self,
        batch_id_hash: &BatchIdHash,
        provider: &WalletAddress,
    ) -> Result<Option<SubmissionRecord>>;
}

/// Store of batches and their flight selections.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist a batch with its immutable flight-set digest and its
    /// deduplicated flight selection, atomically.
    async fn create_batch(
        &self,
        batch_id: Uuid,
        batch_id_hash: &BatchIdHash,
        flight_set_digest: &str,
        flights: &[FlightSelectionEntry],
    ) -> Result<DateTime<Utc>>;
}

/// Object store issuing time-limited download URLs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Create a signed download URL for a stored object.
    async fn create_signed_url(&self, bucket: &str, path: &str, ttl_secs: u64) -> Result<String>;
}
