//! Wallet challenge message construction and signature verification.
//!
//! Ownership of an address is proven by signing a deterministic challenge
//! string with the wallet's standard personal-message scheme (EIP-191).
//! The message is never persisted: the verifier rebuilds it from the
//! claimed address and the stored nonce record, so any drift in the
//! template or timestamp rendering breaks verification. Changes to either
//! must bump [`CHALLENGE_VERSION`] and invalidate outstanding challenges.

use alloy::primitives::PrimitiveSignature;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{NonceRecord, WalletAddress};
use crate::infra::GatewayError;

/// Version tag for the challenge template. Bump on any change to
/// [`challenge_message`] so stale clients fail verification cleanly.
pub const CHALLENGE_VERSION: u32 = 1;

/// Length of a hex-encoded 65-byte ECDSA signature, without the prefix.
const SIGNATURE_HEX_LEN: usize = 130;

/// Build the exact string a wallet must sign for one challenge.
///
/// The expiry is rendered as whole-second RFC 3339 UTC; nonce records are
/// issued with sub-second precision already truncated so this rendering is
/// stable across the store round trip.
pub fn challenge_message(
    address: &WalletAddress,
    nonce: &str,
    expires_at: DateTime<Utc>,
) -> String {
    format!(
        "FlightVault login\nAddress: {}\nNonce: {}\nExpires: {}",
        address.as_str(),
        nonce,
        expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Check the syntactic shape of a client-supplied signature: `0x` followed
/// by exactly 130 hex characters (r || s || v).
pub fn validate_signature_shape(signature: &str) -> Result<(), GatewayError> {
    let body = signature
        .strip_prefix("0x")
        .ok_or_else(|| GatewayError::BadRequest("signature missing 0x prefix".into()))?;

    if body.len() != SIGNATURE_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GatewayError::BadRequest("malformed signature".into()));
    }
    Ok(())
}

/// Verify that `signature` is the claimed address's personal-sign signature
/// over the challenge reconstructed from `record`.
///
/// Fails closed: malformed input, wrong length, or recovery failure all
/// return `false` rather than an error that could bypass the check.
pub fn verify(claimed: &WalletAddress, record: &NonceRecord, signature: &str) -> bool {
    let body = match signature.strip_prefix("0x") {
        Some(body) if body.len() == SIGNATURE_HEX_LEN => body,
        _ => return false,
    };
    let bytes = match hex::decode(body) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = match PrimitiveSignature::try_from(bytes.as_slice()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = challenge_message(claimed, &record.nonce, record.expires_at);
    match signature.recover_address_from_msg(message.as_bytes()) {
        Ok(recovered) => WalletAddress::from_alloy(recovered) == *claimed,
        Err(_) => false,
    }
}
