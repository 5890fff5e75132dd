//! Nonce authority: issues, stores, and single-use-consumes per-address
//! challenge nonces.
//!
//! One live challenge per address. Reissuing overwrites the previous
//! record, which stops an address from hoarding valid nonces. Consumption
//! is a single atomic delete-and-return in the backing store, so two
//! concurrent authorization attempts for the same address race to exactly
//! one winner; the loser observes `NoNonce`.

use std::sync::Arc;

use chrono::{Duration, SubsecRound, Utc};
use rand::RngCore;

use crate::domain::{NonceRecord, WalletAddress};
use crate::infra::{GatewayError, NonceStore};

/// Default challenge lifetime.
pub const DEFAULT_NONCE_TTL_SECS: i64 = 300;

/// Nonce consumption failures.
#[derive(Debug, thiserror::Error)]
pub enum NonceError {
    /// No live challenge for this address (never issued, already spent,
    /// or lost the consumption race).
    #[error("no active challenge for address")]
    NoNonce,

    /// The challenge existed but its expiry had passed. The record is
    /// consumed regardless; a fresh challenge must be issued.
    #[error("challenge expired")]
    Expired,

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] GatewayError),
}

/// Issues and consumes single-use challenge nonces.
pub struct NonceAuthority {
    store: Arc<dyn NonceStore>,
    ttl: Duration,
}

impl NonceAuthority {
    pub fn new(store: Arc<dyn NonceStore>, ttl_secs: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a fresh challenge nonce for an address, overwriting any prior
    /// record.
    ///
    /// The expiry is truncated to whole seconds so its RFC 3339 rendering
    /// in the challenge message survives the store round trip unchanged.
    pub async fn issue(&self, address: &WalletAddress) -> Result<NonceRecord, GatewayError> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        let record = NonceRecord {
            address: address.clone(),
            nonce: hex::encode(bytes),
            expires_at: (Utc::now() + self.ttl).trunc_subsecs(0),
        };
        self.store.upsert(&record).await?;
        Ok(record)
    }

    /// Consume the live challenge for an address.
    ///
    /// The record is deleted whether or not it turns out to be expired;
    /// a spent nonce stays spent.
    pub async fn consume(&self, address: &WalletAddress) -> Result<NonceRecord, NonceError> {
        let record = self
            .store
            .consume(address)
            .await?
            .ok_or(NonceError::NoNonce)?;

        if Utc::now() > record.expires_at {
            return Err(NonceError::Expired);
        }
        Ok(record)
    }
}
