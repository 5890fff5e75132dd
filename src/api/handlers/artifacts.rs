//! Artifact authorization endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeArtifactRequest {
    pub address: String,
    /// Signature over the active challenge message, `0x` + 130 hex chars.
    pub signature: String,
    pub batch_id_hash: String,
    pub provider_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeArtifactResponse {
    pub ok: bool,
    /// Signed download URL; valid for `expires_in_sec` seconds.
    pub url: String,
    pub expires_in_sec: u64,
}

/// `POST /v1/artifacts/authorize`
///
/// Runs the one-shot challenge/response protocol and, on success, returns
/// a short-lived signed URL for the requested provider's latest submission
/// in the batch.
pub async fn authorize_artifact(
    State(state): State<AppState>,
    Json(req): Json<AuthorizeArtifactRequest>,
) -> Result<Json<AuthorizeArtifactResponse>, ApiError> {
    let grant = state
        .gateway
        .authorize_artifact(
            &req.address,
            &req.signature,
            &req.batch_id_hash,
            &req.provider_address,
        )
        .await?;

    Ok(Json(AuthorizeArtifactResponse {
        ok: true,
        url: grant.url,
        expires_in_sec: grant.expires_in_secs,
    }))
}
