//! Authentication for the FlightVault gateway.
//!
//! Callers prove wallet ownership through a one-shot challenge/response:
//! the [`nonce`] module issues and consumes the single-use nonces the
//! challenge is bound to.

pub mod nonce;

pub use nonce::{NonceAuthority, NonceError, DEFAULT_NONCE_TTL_SECS};
