//! Authorization gateway orchestration.
//!
//! Decides whether a caller may obtain a time-limited handle to a specific
//! provider's submission artifact for a specific batch, and mediates
//! issuance of that handle. The protocol is a strict one-shot
//! challenge/response: every authorization attempt consumes the caller's
//! nonce up front, so a captured signature cannot be replayed across
//! resource fetches, and an attempt abandoned mid-flight still costs the
//! nonce.
//!
//! Step order is load-bearing. Input validation happens before any side
//! effect; the nonce is consumed before the signature is checked; chain
//! truth is read before the entitlement decision; the submission lookup
//! and URL signing come last. Each step's failure is terminal.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{NonceAuthority, NonceError};
use crate::chain::ChainReader;
use crate::crypto::challenge;
use crate::domain::{BatchIdHash, NonceRecord, SubmissionRecord, WalletAddress};
use crate::infra::{ArtifactStore, GatewayError, Result, SubmissionStore};

/// Default lifetime of an issued artifact handle.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 60;

/// A granted artifact handle.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactGrant {
    pub url: String,
    pub expires_in_secs: u64,
}

/// An issued challenge, returned to the caller for signing.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub record: NonceRecord,
    pub message: String,
}

/// Orchestrates nonce consumption, signature verification, chain reads,
/// and artifact handle issuance.
pub struct AuthorizationGateway {
    nonces: NonceAuthority,
    chain: Arc<dyn ChainReader>,
    submissions: Arc<dyn SubmissionStore>,
    artifacts: Arc<dyn ArtifactStore>,
    signed_url_ttl_secs: u64,
}

impl AuthorizationGateway {
    pub fn new(
        nonces: NonceAuthority,
        chain: Arc<dyn ChainReader>,
        submissions: Arc<dyn SubmissionStore>,
        artifacts: Arc<dyn ArtifactStore>,
        signed_url_ttl_secs: u64,
    ) -> Self {
        Self {
            nonces,
            chain,
            submissions,
            artifacts,
            signed_url_ttl_secs,
        }
    }

    /// Issue a fresh challenge for an address, overwriting any prior one.
    pub async fn issue_challenge(&self, address: &str) -> Result<IssuedChallenge> {
        let address = WalletAddress::parse(address)?;
        let record = self.nonces.issue(&address).await?;
        let message = challenge::challenge_message(&address, &record.nonce, record.expires_at);

        info!(address = %address, expires_at = %record.expires_at, "challenge issued");
        Ok(IssuedChallenge { record, message })
    }

    /// Run the full authorization protocol for one artifact request.
    pub async fn authorize_artifact(
        &self,
        address: &str,
        signature: &str,
        batch_id_hash: &str,
        provider_address: &str,
    ) -> Result<ArtifactGrant> {
        // Step 1: syntactic validation, no side effects on failure.
        let caller = WalletAddress::parse(address)?;
        let provider = WalletAddress::parse(provider_address)?;
        let batch_id_hash = BatchIdHash::parse(batch_id_hash)?;
        challenge::validate_signature_shape(signature)?;

        // Step 2: consume the nonce. Spent from here on, success or not.
        let record = self.consume_nonce(&caller).await?;

        // Step 3: verify the signature over the reconstructed challenge.
        if !challenge::verify(&caller, &record, signature) {
            warn!(address = %caller, "challenge signature verification failed");
            return Err(GatewayError::Unauthenticated(
                "signature verification failed".into(),
            ));
        }

        // Step 4: read authoritative batch state from the chain.
        let batch = self
            .chain
            .get_batch(&batch_id_hash)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("batch not found: {batch_id_hash}")))?;

        // Step 5: entitlement. The operator and funder may audit any
        // provider's submission; a provider may always fetch its own.
        let entitled = caller == batch.operator || caller == batch.funder || caller == provider;
        if !entitled {
            warn!(
                address = %caller,
                batch = %batch_id_hash,
                provider = %provider,
                "artifact access denied"
            );
            return Err(GatewayError::Forbidden(
                "caller is not the batch operator, funder, or requested provider".into(),
            ));
        }

        // Step 6: most recent submission for (batch, provider).
        let submission = self
            .submissions
            .find_latest(&batch_id_hash, &provider)
            .await?
            .ok_or_else(|| {
                GatewayError::NotFound(format!(
                    "no submission for provider {provider} in batch {batch_id_hash}"
                ))
            })?;

        // Step 7: time-limited handle from the object store.
        let url = self
            .artifacts
            .create_signed_url(
                &submission.storage_bucket,
                &submission.storage_path,
                self.signed_url_ttl_secs,
            )
            .await?;

        info!(
            address = %caller,
            batch = %batch_id_hash,
            provider = %provider,
            ttl_secs = self.signed_url_ttl_secs,
            "artifact handle granted"
        );

        Ok(ArtifactGrant {
            url,
            expires_in_secs: self.signed_url_ttl_secs,
        })
    }

    /// Record a provider's uploaded artifact pointer.
    ///
    /// Same challenge/response discipline as artifact authorization, plus a
    /// participation check: only an address that has joined the batch
    /// on-chain may register a submission for it.
    pub async fn register_submission(
        &self,
        address: &str,
        signature: &str,
        batch_id_hash: &str,
        storage_bucket: &str,
        storage_path: &str,
    ) -> Result<SubmissionRecord> {
        let caller = WalletAddress::parse(address)?;
        let batch_id_hash = BatchIdHash::parse(batch_id_hash)?;
        challenge::validate_signature_shape(signature)?;
        if storage_bucket.is_empty() || storage_path.is_empty() {
            return Err(GatewayError::BadRequest(
                "storage bucket and path are required".into(),
            ));
        }

        let record = self.consume_nonce(&caller).await?;
        if !challenge::verify(&caller, &record, signature) {
            warn!(address = %caller, "challenge signature verification failed");
            return Err(GatewayError::Unauthenticated(
                "signature verification failed".into(),
            ));
        }

        self.chain
            .get_batch(&batch_id_hash)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("batch not found: {batch_id_hash}")))?;

        let summary = self
            .chain
            .get_provider_summary(&batch_id_hash, &caller)
            .await?;
        if !summary.joined {
            warn!(address = %caller, batch = %batch_id_hash, "submission from non-participant");
            return Err(GatewayError::Forbidden(
                "caller has not joined this batch on-chain".into(),
            ));
        }

        let submission = SubmissionRecord {
            batch_id_hash,
            provider_address: caller,
            storage_bucket: storage_bucket.to_string(),
            storage_path: storage_path.to_string(),
            created_at: Utc::now(),
        };
        self.submissions.insert(&submission).await?;

        info!(
            address = %submission.provider_address,
            batch = %submission.batch_id_hash,
            "submission registered"
        );
        Ok(submission)
    }

    async fn consume_nonce(&self, caller: &WalletAddress) -> Result<NonceRecord> {
        self.nonces.consume(caller).await.map_err(|e| match e {
            NonceError::NoNonce => {
                GatewayError::Unauthenticated("no active challenge; request a new one".into())
            }
            NonceError::Expired => {
                GatewayError::Unauthenticated("challenge expired; request a new one".into())
            }
            NonceError::Store(inner) => inner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_NONCE_TTL_SECS;
    use crate::chain::{BatchState, MockChainReader, ProviderSummary};
    use crate::domain::SubmissionRecord;
    use crate::infra::{MockArtifactStore, MockSubmissionStore, NonceStore};
    use alloy::primitives::U256;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use chrono::{Duration, SubsecRound, Utc};
    use std::sync::Mutex;

    const OPERATOR: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const FUNDER: &str = "0xffffffffffffffffffffffffffffffffffffffff";
    const PROVIDER: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
    const STRANGER: &str = "0x1111111111111111111111111111111111111111";

    fn batch_hash() -> BatchIdHash {
        BatchIdHash::from_batch_id("pool-2030-01")
    }

    fn batch_state(operator: &str, funder: &str) -> BatchState {
        BatchState {
            operator: WalletAddress::parse(operator).unwrap(),
            funder: WalletAddress::parse(funder).unwrap(),
            window_start: 1_893_456_000,
            window_end: 1_893_542_400,
            reveal_deadline: 1_893_628_800,
            seed_hash: [7u8; 32],
            funded: true,
            finalized: false,
            bounty: U256::from(1_000_000u64),
            commit_deadline: 1_893_500_000,
            max_providers: 16,
        }
    }

    fn submission(provider: &str) -> SubmissionRecord {
        SubmissionRecord {
            batch_id_hash: batch_hash(),
            provider_address: WalletAddress::parse(provider).unwrap(),
            storage_bucket: "submissions".to_string(),
            storage_path: "pool-2030-01/predictions.json".to_string(),
            created_at: Utc::now(),
        }
    }

    /// In-memory nonce store with atomic take semantics, for protocol
    /// tests that need a real consume-once behavior.
    struct MemNonceStore {
        rows: Mutex<Option<NonceRecord>>,
    }

    impl MemNonceStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl NonceStore for MemNonceStore {
        async fn upsert(&self, record: &NonceRecord) -> Result<()> {
            *self.rows.lock().unwrap() = Some(record.clone());
            Ok(())
        }

        async fn consume(&self, address: &WalletAddress) -> Result<Option<NonceRecord>> {
            let mut rows = self.rows.lock().unwrap();
            match rows.as_ref() {
                Some(record) if record.address == *address => Ok(rows.take()),
                _ => Ok(None),
            }
        }
    }

    struct GatewayBuilder {
        nonce_store: Arc<dyn NonceStore>,
        chain: MockChainReader,
        submissions: MockSubmissionStore,
        artifacts: MockArtifactStore,
    }

    impl GatewayBuilder {
        fn new() -> Self {
            Self {
                nonce_store: Arc::new(MemNonceStore::new()),
                chain: MockChainReader::new(),
                submissions: MockSubmissionStore::new(),
                artifacts: MockArtifactStore::new(),
            }
        }

        fn build(self) -> AuthorizationGateway {
            AuthorizationGateway::new(
                NonceAuthority::new(self.nonce_store, DEFAULT_NONCE_TTL_SECS),
                Arc::new(self.chain),
                Arc::new(self.submissions),
                Arc::new(self.artifacts),
                DEFAULT_SIGNED_URL_TTL_SECS,
            )
        }
    }

    /// Seed a consumable nonce and produce a valid signature for it.
    async fn signed_challenge(
        store: &dyn NonceStore,
        signer: &PrivateKeySigner,
    ) -> (WalletAddress, String) {
        let address = WalletAddress::from_alloy(signer.address());
        let record = NonceRecord {
            address: address.clone(),
            nonce: "deadbeef".to_string(),
            expires_at: (Utc::now() + Duration::seconds(300)).trunc_subsecs(0),
        };
        store.upsert(&record).await.unwrap();

        let message =
            challenge::challenge_message(&address, &record.nonce, record.expires_at);
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        (address, format!("0x{}", hex::encode(signature.as_bytes())))
    }

    #[tokio::test]
    async fn test_end_to_end_operator_granted() {
        let signer = PrivateKeySigner::random();
        let caller = WalletAddress::from_alloy(signer.address());
        let caller_hex = caller.as_str().to_string();

        let mut builder = GatewayBuilder::new();
        let op = caller_hex.clone();
        builder
            .chain
            .expect_get_batch()
            .returning(move |_| Ok(Some(batch_state(&op, FUNDER))));
        builder
            .submissions
            .expect_find_latest()
            .returning(|_, _| Ok(Some(submission(PROVIDER))));
        builder
            .artifacts
            .expect_create_signed_url()
            .withf(|bucket, path, ttl| {
                bucket == "submissions"
                    && path == "pool-2030-01/predictions.json"
                    && *ttl == DEFAULT_SIGNED_URL_TTL_SECS
            })
            .returning(|_, _, _| Ok("https://store.example/signed".to_string()));

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        let grant = gateway
            .authorize_artifact(&caller_hex, &signature, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap();

        assert_eq!(grant.url, "https://store.example/signed");
        assert_eq!(grant.expires_in_secs, 60);
    }

    #[tokio::test]
    async fn test_signer_mismatch_is_unauthenticated() {
        let signer = PrivateKeySigner::random();

        let mut builder = GatewayBuilder::new();
        builder.chain.expect_get_batch().never();

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();

        // Valid signature from the signer, but the caller claims OPERATOR.
        let (real_address, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;
        assert_ne!(real_address.as_str(), OPERATOR);

        // Seed a nonce for the claimed address so step 2 passes.
        let claimed = WalletAddress::parse(OPERATOR).unwrap();
        nonce_store
            .upsert(&NonceRecord {
                address: claimed.clone(),
                nonce: "deadbeef".to_string(),
                expires_at: Utc::now() + Duration::seconds(300),
            })
            .await
            .unwrap();

        let err = gateway
            .authorize_artifact(OPERATOR, &signature, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_entitlement_matrix() {
        for (caller_key, outcome_ok) in [
            ("operator", true),
            ("funder", true),
            ("provider", true),
            ("stranger", false),
        ] {
            let signer = PrivateKeySigner::random();
            let caller = WalletAddress::from_alloy(signer.address());
            let caller_hex = caller.as_str().to_string();

            // Place the caller into the requested role.
            let (operator, funder, provider) = match caller_key {
                "operator" => (caller_hex.clone(), FUNDER.to_string(), PROVIDER.to_string()),
                "funder" => (OPERATOR.to_string(), caller_hex.clone(), PROVIDER.to_string()),
                "provider" => (OPERATOR.to_string(), FUNDER.to_string(), caller_hex.clone()),
                _ => (
                    OPERATOR.to_string(),
                    FUNDER.to_string(),
                    PROVIDER.to_string(),
                ),
            };

            let mut builder = GatewayBuilder::new();
            let (op, fu) = (operator.clone(), funder.clone());
            builder
                .chain
                .expect_get_batch()
                .returning(move |_| Ok(Some(batch_state(&op, &fu))));
            let prov = provider.clone();
            builder
                .submissions
                .expect_find_latest()
                .returning(move |_, _| Ok(Some(submission(&prov))));
            builder
                .artifacts
                .expect_create_signed_url()
                .returning(|_, _, _| Ok("https://store.example/signed".to_string()));

            let nonce_store = builder.nonce_store.clone();
            let gateway = builder.build();
            let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

            let result = gateway
                .authorize_artifact(&caller_hex, &signature, batch_hash().as_str(), &provider)
                .await;

            if outcome_ok {
                assert!(result.is_ok(), "{caller_key} should be entitled");
            } else {
                assert!(
                    matches!(result, Err(GatewayError::Forbidden(_))),
                    "{caller_key} should be forbidden"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_batch_not_found_precedes_entitlement() {
        let signer = PrivateKeySigner::random();
        let caller = WalletAddress::from_alloy(signer.address());
        let caller_hex = caller.as_str().to_string();

        let mut builder = GatewayBuilder::new();
        builder.chain.expect_get_batch().returning(|_| Ok(None));
        builder.submissions.expect_find_latest().never();

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        // Caller would be the provider (entitled), but the batch is absent.
        let err = gateway
            .authorize_artifact(&caller_hex, &signature, batch_hash().as_str(), &caller_hex)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_chain_unavailable_propagates() {
        let signer = PrivateKeySigner::random();
        let caller_hex = WalletAddress::from_alloy(signer.address())
            .as_str()
            .to_string();

        let mut builder = GatewayBuilder::new();
        builder.chain.expect_get_batch().returning(|_| {
            Err(GatewayError::ServiceUnavailable("chain RPC failed".into()))
        });

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        let err = gateway
            .authorize_artifact(&caller_hex, &signature, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_submission_is_not_found() {
        let signer = PrivateKeySigner::random();
        let caller = WalletAddress::from_alloy(signer.address());
        let caller_hex = caller.as_str().to_string();

        let mut builder = GatewayBuilder::new();
        let op = caller_hex.clone();
        builder
            .chain
            .expect_get_batch()
            .returning(move |_| Ok(Some(batch_state(&op, FUNDER))));
        builder
            .submissions
            .expect_find_latest()
            .returning(|_, _| Ok(None));
        builder.artifacts.expect_create_signed_url().never();

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        let err = gateway
            .authorize_artifact(&caller_hex, &signature, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_input_consumes_nothing() {
        let builder = GatewayBuilder::new();
        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();

        let record = NonceRecord {
            address: WalletAddress::parse(OPERATOR).unwrap(),
            nonce: "deadbeef".to_string(),
            expires_at: Utc::now() + Duration::seconds(300),
        };
        nonce_store.upsert(&record).await.unwrap();

        let err = gateway
            .authorize_artifact(OPERATOR, "not-a-signature", batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));

        // The nonce survives a syntactically bad request.
        let survivor = nonce_store
            .consume(&WalletAddress::parse(OPERATOR).unwrap())
            .await
            .unwrap();
        assert!(survivor.is_some());
    }

    #[tokio::test]
    async fn test_failed_verification_still_spends_nonce() {
        let builder = GatewayBuilder::new();
        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();

        let claimed = WalletAddress::parse(OPERATOR).unwrap();
        nonce_store
            .upsert(&NonceRecord {
                address: claimed.clone(),
                nonce: "deadbeef".to_string(),
                expires_at: Utc::now() + Duration::seconds(300),
            })
            .await
            .unwrap();

        // Well-formed but invalid signature: consumed nonce, failed verify.
        let bogus = format!("0x{}", "11".repeat(65));
        let err = gateway
            .authorize_artifact(OPERATOR, &bogus, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated(_)));

        // Retry without reissue fails with no active challenge.
        let err = gateway
            .authorize_artifact(OPERATOR, &bogus, batch_hash().as_str(), PROVIDER)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated(_)));
        assert!(nonce_store.consume(&claimed).await.unwrap().is_none());
    }

    fn provider_summary(joined: bool) -> ProviderSummary {
        ProviderSummary {
            joined,
            commit_count: 3,
            revealed_count: 0,
            bond: U256::from(50_000u64),
            payout: U256::ZERO,
            paid: false,
        }
    }

    #[tokio::test]
    async fn test_register_submission_for_joined_provider() {
        let signer = PrivateKeySigner::random();
        let caller = WalletAddress::from_alloy(signer.address());
        let caller_hex = caller.as_str().to_string();

        let mut builder = GatewayBuilder::new();
        builder
            .chain
            .expect_get_batch()
            .returning(|_| Ok(Some(batch_state(OPERATOR, FUNDER))));
        builder
            .chain
            .expect_get_provider_summary()
            .returning(|_, _| Ok(provider_summary(true)));
        let expected_caller = caller.clone();
        builder
            .submissions
            .expect_insert()
            .withf(move |record| {
                record.provider_address == expected_caller
                    && record.storage_bucket == "submissions"
                    && record.storage_path == "pool-2030-01/predictions.json"
            })
            .returning(|_| Ok(()));

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        let record = gateway
            .register_submission(
                &caller_hex,
                &signature,
                batch_hash().as_str(),
                "submissions",
                "pool-2030-01/predictions.json",
            )
            .await
            .unwrap();
        assert_eq!(record.batch_id_hash, batch_hash());
    }

    #[tokio::test]
    async fn test_register_submission_requires_joined_provider() {
        let signer = PrivateKeySigner::random();
        let caller_hex = WalletAddress::from_alloy(signer.address())
            .as_str()
            .to_string();

        let mut builder = GatewayBuilder::new();
        builder
            .chain
            .expect_get_batch()
            .returning(|_| Ok(Some(batch_state(OPERATOR, FUNDER))));
        builder
            .chain
            .expect_get_provider_summary()
            .returning(|_, _| Ok(provider_summary(false)));
        builder.submissions.expect_insert().never();

        let nonce_store = builder.nonce_store.clone();
        let gateway = builder.build();
        let (_, signature) = signed_challenge(nonce_store.as_ref(), &signer).await;

        let err = gateway
            .register_submission(
                &caller_hex,
                &signature,
                batch_hash().as_str(),
                "submissions",
                "x.json",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_issue_challenge_returns_signable_message() {
        let builder = GatewayBuilder::new();
        let gateway = builder.build();

        let issued = gateway.issue_challenge(OPERATOR).await.unwrap();
        assert!(issued.message.starts_with("FlightVault login\n"));
        assert!(issued.message.contains(&issued.record.nonce));
        assert!(gateway.issue_challenge("0x12").await.is_err());
    }
}
