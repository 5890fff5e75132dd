//! PostgreSQL-backed batch store.
//!
//! A batch and its flight selection are written in one transaction; the
//! flight-set digest is computed before the write and never updated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::domain::{BatchIdHash, FlightSelectionEntry};
use crate::infra::{BatchStore, Result};

/// PostgreSQL implementation of [`BatchStore`].
pub struct PgBatchStore {
    pool: PgPool,
}

impl PgBatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchStore for PgBatchStore {
    async fn create_batch(
        &self,
        batch_id: Uuid,
        batch_id_hash: &BatchIdHash,
        flight_set_digest: &str,
        flights: &[FlightSelectionEntry],
    ) -> Result<DateTime<Utc>> {
        let mut tx = self.pool.begin().await?;

        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO batches (batch_id, batch_id_hash, flight_set_digest, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING created_at
            "#,
        )
        .bind(batch_id)
        .bind(batch_id_hash.as_str())
        .bind(flight_set_digest)
        .fetch_one(&mut *tx)
        .await?;

        for flight in flights {
            sqlx::query(
                r#"
                INSERT INTO batch_flights
                    (batch_id, flight_key, carrier, flight_number, origin, destination,
                     scheduled_departure, scheduled_arrival, terminal, gate)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(batch_id)
            .bind(&flight.flight_key)
            .bind(&flight.carrier)
            .bind(&flight.flight_number)
            .bind(&flight.origin)
            .bind(&flight.destination)
            .bind(flight.scheduled_departure)
            .bind(flight.scheduled_arrival)
            .bind(&flight.terminal)
            .bind(&flight.gate)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created_at)
    }
}
