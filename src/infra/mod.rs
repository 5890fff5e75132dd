//! Infrastructure implementations for the FlightVault gateway.

mod error;
pub mod object_store;
pub mod postgres;
mod traits;

pub use error::{GatewayError, Result};
pub use object_store::{HttpArtifactStore, ObjectStoreConfig};
pub use postgres::{PgBatchStore, PgNonceStore, PgSubmissionStore};
pub use traits::{ArtifactStore, BatchStore, NonceStore, SubmissionStore};

#[cfg(test)]
pub use traits::{MockArtifactStore, MockBatchStore, MockNonceStore, MockSubmissionStore};
