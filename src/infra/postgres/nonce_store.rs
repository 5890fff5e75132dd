//! PostgreSQL-backed nonce store.
//!
//! The single-winner guarantee for concurrent consumption lives entirely in
//! `DELETE .. RETURNING`: PostgreSQL deletes the row and hands back its old
//! contents as one atomic operation, so the second of two racing callers
//! sees zero rows, never a stale nonce. No gateway-level locking exists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::{NonceRecord, WalletAddress};
use crate::infra::{NonceStore, Result};

/// PostgreSQL implementation of [`NonceStore`].
pub struct PgNonceStore {
    pool: PgPool,
}

impl PgNonceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete all expired nonce rows. Called opportunistically; correctness
    /// does not depend on it because consumption checks expiry itself.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_nonces WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NonceStore for PgNonceStore {
    async fn upsert(&self, record: &NonceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_nonces (address, nonce, expires_at, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (address)
            DO UPDATE SET nonce = EXCLUDED.nonce,
                          expires_at = EXCLUDED.expires_at,
                          created_at = NOW()
            "#,
        )
        .bind(record.address.as_str())
        .bind(&record.nonce)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume(&self, address: &WalletAddress) -> Result<Option<NonceRecord>> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            DELETE FROM auth_nonces
            WHERE address = $1
            RETURNING nonce, expires_at
            "#,
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((nonce, expires_at)) => Ok(Some(NonceRecord {
                address: address.clone(),
                nonce,
                expires_at,
            })),
            None => Ok(None),
        }
    }
}
