//! Batch creation endpoint.

use std::collections::HashSet;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiError;
use crate::crypto::digest;
use crate::domain::{BatchIdHash, FlightSelectionEntry};
use crate::infra::GatewayError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Client-generated batch identifier; `keccak256` of its string form
    /// is the on-chain key.
    pub batch_id: Uuid,
    pub flights: Vec<FlightSelectionEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchResponse {
    pub ok: bool,
    pub batch_id: Uuid,
    pub batch_id_hash: BatchIdHash,
    pub flight_set_digest: String,
    /// Count after deduplication by flight key.
    pub flight_count: usize,
    pub created_at: DateTime<Utc>,
}

/// `POST /v1/batches`
///
/// Validates the flight selection, computes its canonical digest, and
/// persists batch and flights atomically. The digest returned here is the
/// value the funder anchors on-chain; it never changes afterwards.
pub async fn create_batch(
    State(state): State<AppState>,
    Json(req): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<CreateBatchResponse>), ApiError> {
    for flight in &req.flights {
        flight.validate()?;
    }

    let flight_set_digest = digest::flight_selection_digest(&req.flights)
        .map_err(|e| GatewayError::BadRequest(e.to_string()))?;

    let mut seen = HashSet::new();
    let flights: Vec<FlightSelectionEntry> = req
        .flights
        .iter()
        .filter(|f| seen.insert(f.flight_key.clone()))
        .cloned()
        .collect();

    let batch_id_hash = BatchIdHash::from_batch_id(&req.batch_id.to_string());
    let created_at = state
        .batches
        .create_batch(req.batch_id, &batch_id_hash, &flight_set_digest, &flights)
        .await
        .map_err(|e| match &e {
            GatewayError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                GatewayError::BadRequest(format!("batch already exists: {}", req.batch_id))
            }
            _ => e,
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBatchResponse {
            ok: true,
            batch_id: req.batch_id,
            batch_id_hash,
            flight_set_digest,
            flight_count: flights.len(),
            created_at,
        }),
    ))
}
