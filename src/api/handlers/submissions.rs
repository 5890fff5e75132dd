//! Submission registration endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::domain::{BatchIdHash, WalletAddress};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSubmissionRequest {
    pub address: String,
    /// Signature over the active challenge message.
    pub signature: String,
    pub batch_id_hash: String,
    pub storage_bucket: String,
    pub storage_path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSubmissionResponse {
    pub ok: bool,
    pub batch_id_hash: BatchIdHash,
    pub provider_address: WalletAddress,
    pub created_at: DateTime<Utc>,
}

/// `POST /v1/submissions`
///
/// Records the storage location of an uploaded prediction artifact. The
/// caller authenticates with the challenge protocol and must have joined
/// the batch on-chain; the recorded provider is always the verified
/// caller, never a field of the request.
pub async fn record_submission(
    State(state): State<AppState>,
    Json(req): Json<RecordSubmissionRequest>,
) -> Result<(StatusCode, Json<RecordSubmissionResponse>), ApiError> {
    let record = state
        .gateway
        .register_submission(
            &req.address,
            &req.signature,
            &req.batch_id_hash,
            &req.storage_bucket,
            &req.storage_path,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordSubmissionResponse {
            ok: true,
            batch_id_hash: record.batch_id_hash,
            provider_address: record.provider_address,
            created_at: record.created_at,
        }),
    ))
}
