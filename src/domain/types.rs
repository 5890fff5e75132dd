//! Domain types shared across the gateway.
//!
//! Addresses and batch hashes arrive from an adversarial caller, so every
//! constructor here validates shape before anything downstream touches the
//! value. Comparisons are always over the lowercase form.

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::GatewayError;

/// A chain wallet address: `0x` + 40 hex characters, held lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize an address. Rejects anything that is not
    /// `0x` followed by exactly 40 hex characters.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let body = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| GatewayError::BadRequest(format!("address missing 0x prefix: {raw}")))?;

        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GatewayError::BadRequest(format!(
                "malformed address: {raw}"
            )));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Build from an alloy [`Address`], normalizing to lowercase hex.
    pub fn from_alloy(address: Address) -> Self {
        Self(format!("0x{}", hex::encode(address.as_slice())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to an alloy [`Address`] for contract calls.
    pub fn to_alloy(&self) -> Address {
        // Shape was validated in parse(); a 20-byte decode cannot fail here.
        let mut bytes = [0u8; 20];
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            bytes.copy_from_slice(&decoded);
        }
        Address::from(bytes)
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-chain batch identifier: `0x` + 64 hex characters (a `bytes32` key),
/// held lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchIdHash(String);

impl BatchIdHash {
    /// Parse and normalize a batch id hash.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let body = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| {
                GatewayError::BadRequest(format!("batch id hash missing 0x prefix: {raw}"))
            })?;

        if body.len() != 64 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GatewayError::BadRequest(format!(
                "malformed batch id hash: {raw}"
            )));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Derive the on-chain key for an off-chain batch identifier.
    ///
    /// The settlement contract keys batches by `keccak256(batchId)`.
    pub fn from_batch_id(batch_id: &str) -> Self {
        let digest = alloy::primitives::keccak256(batch_id.as_bytes());
        Self(format!("0x{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a [`B256`] for contract calls.
    pub fn to_b256(&self) -> B256 {
        let mut bytes = [0u8; 32];
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            bytes.copy_from_slice(&decoded);
        }
        B256::from(bytes)
    }
}

impl std::fmt::Display for BatchIdHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single-use challenge nonce bound to one address.
///
/// At most one live record per address; the row is deleted the moment it is
/// consumed, successfully or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    pub address: WalletAddress,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// One flight chosen into a batch, as submitted by the funder's client.
///
/// `flight_key` is the opaque identifier the digest engine commits to;
/// entries are deduplicated by it before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSelectionEntry {
    pub flight_key: String,
    pub carrier: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub scheduled_departure: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_arrival: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
}

impl FlightSelectionEntry {
    /// Validate the syntactic shape of a client-submitted entry.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.flight_key.is_empty() || self.flight_key.len() > 128 {
            return Err(GatewayError::BadRequest(
                "flight key must be 1-128 characters".into(),
            ));
        }
        if self.flight_key.contains(crate::crypto::digest::FLIGHT_KEY_SEPARATOR) {
            return Err(GatewayError::BadRequest(format!(
                "flight key contains reserved separator: {:?}",
                self.flight_key
            )));
        }
        for (field, value) in [
            ("carrier", &self.carrier),
            ("flightNumber", &self.flight_number),
            ("origin", &self.origin),
            ("destination", &self.destination),
        ] {
            if value.is_empty() || value.len() > 8 {
                return Err(GatewayError::BadRequest(format!(
                    "{field} must be 1-8 characters"
                )));
            }
        }
        Ok(())
    }
}

/// A persisted batch of flights with its immutable commitment anchor.
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub batch_id: uuid::Uuid,
    pub batch_id_hash: BatchIdHash,
    pub flight_set_digest: String,
    pub created_at: DateTime<Utc>,
}

/// Pointer to a provider's uploaded artifact for one batch.
///
/// Many rows may exist per (batch, provider); lookups take the most recent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub batch_id_hash: BatchIdHash,
    pub provider_address: WalletAddress,
    pub storage_bucket: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}
