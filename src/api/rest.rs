//! Versioned REST routes.

use axum::routing::post;
use axum::Router;

use crate::api::handlers;
use crate::server::AppState;

/// Routes under `/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/auth/challenge",
            post(handlers::challenge::issue_challenge),
        )
        .route(
            "/v1/artifacts/authorize",
            post(handlers::artifacts::authorize_artifact),
        )
        .route("/v1/batches", post(handlers::batches::create_batch))
        .route(
            "/v1/submissions",
            post(handlers::submissions::record_submission),
        )
}
