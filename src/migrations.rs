//! Idempotent startup migrations for the gateway's PostgreSQL schema.

use sqlx::postgres::PgPool;

/// Create the gateway's tables and indexes if they do not exist.
pub async fn run_postgres(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One live challenge nonce per address.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_nonces (
            address VARCHAR(42) PRIMARY KEY,
            nonce VARCHAR(64) NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only submission history; most-recent-wins on lookup.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id BIGSERIAL PRIMARY KEY,
            batch_id_hash VARCHAR(66) NOT NULL,
            provider_address VARCHAR(42) NOT NULL,
            storage_bucket TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_submissions_lookup
        ON submissions (batch_id_hash, provider_address, created_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    // Batches with their immutable flight-set digest.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            batch_id UUID PRIMARY KEY,
            batch_id_hash VARCHAR(66) NOT NULL UNIQUE,
            flight_set_digest VARCHAR(66) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batch_flights (
            batch_id UUID NOT NULL REFERENCES batches (batch_id) ON DELETE CASCADE,
            flight_key VARCHAR(128) NOT NULL,
            carrier VARCHAR(8) NOT NULL,
            flight_number VARCHAR(8) NOT NULL,
            origin VARCHAR(8) NOT NULL,
            destination VARCHAR(8) NOT NULL,
            scheduled_departure TIMESTAMPTZ NOT NULL,
            scheduled_arrival TIMESTAMPTZ,
            terminal TEXT,
            gate TEXT,
            PRIMARY KEY (batch_id, flight_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
