//! Read-only settlement contract state reader.
//!
//! Authorization decisions rest entirely on what the FlightEscrow contract
//! says right now: batch state is re-read per request and never cached, so
//! a stale local copy can never grant access. The reader distinguishes
//! three outcomes and nothing else: state, not-found (`exists == false`),
//! and chain-unavailable. RPC or ABI-shape failures are never collapsed
//! into "not found", and decode errors fail closed as internal errors in
//! case a future contract version changes the return tuple.

use alloy::primitives::U256;
use alloy::providers::ProviderBuilder;
use alloy::sol;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{BatchIdHash, WalletAddress};
use crate::infra::{GatewayError, Result};

// Contract bindings for the slice of FlightEscrow the gateway reads.
sol! {
    struct BatchView {
        bool exists;
        address operator;
        address funder;
        uint64 windowStart;
        uint64 windowEnd;
        uint64 revealDeadline;
        bytes32 seedHash;
        bool funded;
        bool finalized;
        uint256 bounty;
        uint64 commitDeadline;
        uint16 maxProviders;
    }

    struct ProviderView {
        bool joined;
        uint32 commitCount;
        uint32 revealedCount;
        uint256 bond;
        uint256 payout;
        bool paid;
    }

    #[sol(rpc)]
    interface IFlightEscrow {
        function getBatch(bytes32 batchIdHash) external view returns (BatchView);

        function getProvider(bytes32 batchIdHash, address provider) external view returns (ProviderView);
    }
}

/// Authoritative on-chain batch state, mirrored for a single request.
#[derive(Debug, Clone)]
pub struct BatchState {
    pub operator: WalletAddress,
    pub funder: WalletAddress,
    pub window_start: u64,
    pub window_end: u64,
    pub reveal_deadline: u64,
    pub seed_hash: [u8; 32],
    pub funded: bool,
    pub finalized: bool,
    pub bounty: U256,
    pub commit_deadline: u64,
    pub max_providers: u16,
}

/// Per-provider participation summary for one batch.
#[derive(Debug, Clone)]
pub struct ProviderSummary {
    pub joined: bool,
    pub commit_count: u32,
    pub revealed_count: u32,
    pub bond: U256,
    pub payout: U256,
    pub paid: bool,
}

/// Read-only view of the settlement contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Batch state, or `None` when the batch was never funded on-chain.
    async fn get_batch(&self, batch_id_hash: &BatchIdHash) -> Result<Option<BatchState>>;

    /// Participation summary for one provider in one batch.
    async fn get_provider_summary(
        &self,
        batch_id_hash: &BatchIdHash,
        provider: &WalletAddress,
    ) -> Result<ProviderSummary>;
}

/// Chain reader configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// RPC URL for the settlement chain.
    pub rpc_url: String,
    /// Deployed FlightEscrow contract address.
    pub contract_address: alloy::primitives::Address,
    /// Chain ID, recorded for diagnostics.
    pub chain_id: u64,
}

/// [`ChainReader`] backed by JSON-RPC `eth_call`s against FlightEscrow.
pub struct EthChainReader {
    config: ChainConfig,
}

impl EthChainReader {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    fn map_call_error(e: alloy::contract::Error) -> GatewayError {
        match e {
            alloy::contract::Error::TransportError(e) => {
                GatewayError::ServiceUnavailable(format!("chain RPC failed: {e}"))
            }
            // Anything else means the response decoded against an
            // unexpected ABI shape; fail closed rather than truncate.
            other => GatewayError::Internal(format!("escrow call decode failed: {other}")),
        }
    }
}

#[async_trait]
impl ChainReader for EthChainReader {
    async fn get_batch(&self, batch_id_hash: &BatchIdHash) -> Result<Option<BatchState>> {
        let provider = ProviderBuilder::new().on_http(
            self.config
                .rpc_url
                .parse()
                .map_err(|e| GatewayError::Internal(format!("Invalid RPC URL: {e}")))?,
        );
        let contract = IFlightEscrow::new(self.config.contract_address, &provider);

        let view = contract
            .getBatch(batch_id_hash.to_b256())
            .call()
            .await
            .map_err(Self::map_call_error)?
            ._0;

        if !view.exists {
            return Ok(None);
        }

        Ok(Some(BatchState {
            operator: WalletAddress::from_alloy(view.operator),
            funder: WalletAddress::from_alloy(view.funder),
            window_start: view.windowStart,
            window_end: view.windowEnd,
            reveal_deadline: view.revealDeadline,
            seed_hash: view.seedHash.0,
            funded: view.funded,
            finalized: view.finalized,
            bounty: view.bounty,
            commit_deadline: view.commitDeadline,
            max_providers: view.maxProviders,
        }))
    }

    async fn get_provider_summary(
        &self,
        batch_id_hash: &BatchIdHash,
        provider_address: &WalletAddress,
    ) -> Result<ProviderSummary> {
        let provider = ProviderBuilder::new().on_http(
            self.config
                .rpc_url
                .parse()
                .map_err(|e| GatewayError::Internal(format!("Invalid RPC URL: {e}")))?,
        );
        let contract = IFlightEscrow::new(self.config.contract_address, &provider);

        let view = contract
            .getProvider(batch_id_hash.to_b256(), provider_address.to_alloy())
            .call()
            .await
            .map_err(Self::map_call_error)?
            ._0;

        Ok(ProviderSummary {
            joined: view.joined,
            commit_count: view.commitCount,
            revealed_count: view.revealedCount,
            bond: view.bond,
            payout: view.payout,
            paid: view.paid,
        })
    }
}
