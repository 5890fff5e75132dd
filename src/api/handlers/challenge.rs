//! Challenge issuance endpoint.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub ok: bool,
    pub address: String,
    pub nonce: String,
    /// Exact message the wallet must sign, byte for byte.
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST /v1/auth/challenge`
///
/// Issues a fresh single-use challenge for the address, replacing any
/// challenge issued earlier.
pub async fn issue_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let issued = state.gateway.issue_challenge(&req.address).await?;

    Ok(Json(ChallengeResponse {
        ok: true,
        address: issued.record.address.to_string(),
        nonce: issued.record.nonce,
        message: issued.message,
        expires_at: issued.record.expires_at,
    }))
}
