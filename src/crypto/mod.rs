//! Cryptographic primitives for the FlightVault gateway.
//!
//! - [`digest`] - canonical flight-set digest engine
//! - [`challenge`] - challenge message template and EIP-191 verification

pub mod challenge;
pub mod digest;

pub use challenge::{challenge_message, validate_signature_shape, verify, CHALLENGE_VERSION};
pub use digest::{
    canonical_flight_keys, flight_selection_digest, flight_set_digest, DigestError,
    FLIGHT_KEY_SEPARATOR,
};
