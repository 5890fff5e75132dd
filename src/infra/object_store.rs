//! HTTP client for the object store's URL-signing endpoint.
//!
//! The gateway never proxies artifact bytes; it asks the storage service
//! for a short-lived signed download URL and hands that to the caller.
//! Any failure here is a transient dependency failure from the caller's
//! point of view.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::infra::{ArtifactStore, GatewayError, Result};

/// Object store configuration.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Base URL of the storage service, e.g. `https://storage.internal/storage/v1`.
    pub base_url: String,
    /// Service key sent as a bearer token.
    pub service_key: String,
    /// Request timeout for signing calls.
    pub request_timeout: Duration,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// [`ArtifactStore`] backed by the storage service's signing API.
pub struct HttpArtifactStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpArtifactStore {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("object store client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        })
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn create_signed_url(&self, bucket: &str, path: &str, ttl_secs: u64) -> Result<String> {
        let endpoint = format!(
            "{}/object/sign/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        );

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| GatewayError::ServiceUnavailable(format!("object store: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::ServiceUnavailable(format!(
                "object store signing failed: HTTP {}",
                response.status()
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ServiceUnavailable(format!("object store response: {e}")))?;

        // The service returns a path relative to its base.
        Ok(format!(
            "{}/{}",
            self.base_url,
            body.signed_url.trim_start_matches('/')
        ))
    }
}
