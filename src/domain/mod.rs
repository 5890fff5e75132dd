//! Core domain types for the FlightVault gateway.

mod types;

pub use types::{
    BatchIdHash, BatchRecord, FlightSelectionEntry, NonceRecord, SubmissionRecord, WalletAddress,
};
