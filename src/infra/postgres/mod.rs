//! PostgreSQL-backed stores for the FlightVault gateway.

mod batch_store;
mod nonce_store;
mod submission_store;

pub use batch_store::PgBatchStore;
pub use nonce_store::PgNonceStore;
pub use submission_store::PgSubmissionStore;
