//! PostgreSQL-backed submission store.
//!
//! Submission rows are append-only history: a provider may re-upload, so
//! many rows can exist per (batch, provider). Lookups take the most recent
//! by creation time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::{BatchIdHash, SubmissionRecord, WalletAddress};
use crate::infra::{Result, SubmissionStore};

/// PostgreSQL implementation of [`SubmissionStore`].
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, record: &SubmissionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions
                (batch_id_hash, provider_address, storage_bucket, storage_path, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.batch_id_hash.as_str())
        .bind(record.provider_address.as_str())
        .bind(&record.storage_bucket)
        .bind(&record.storage_path)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest(
        &self,
        batch_id_hash: &BatchIdHash,
        provider: &WalletAddress,
    ) -> Result<Option<SubmissionRecord>> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT storage_bucket, storage_path, created_at
            FROM submissions
            WHERE batch_id_hash = $1 AND provider_address = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(batch_id_hash.as_str())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(storage_bucket, storage_path, created_at)| SubmissionRecord {
            batch_id_hash: batch_id_hash.clone(),
            provider_address: provider.clone(),
            storage_bucket,
            storage_path,
            created_at,
        }))
    }
}
