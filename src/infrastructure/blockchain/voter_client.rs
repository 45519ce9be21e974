//! Voting escrow / voter contract client

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::contracts::{ContractAddresses, IVoter, IVotingEscrow, Multicall3};
use crate::domain::allocation::{proportions_to_vote_weights, summarize_votes};
use crate::shared::errors::ApiError;
use crate::shared::types::{CurrentVotes, VotingPowerInfo};
use crate::shared::utils::{last_thursday_timestamp, wei_to_ether};

/// Raw voter reads behind `get_current_votes`
#[async_trait]
pub trait VoterReader: Send + Sync {
    async fn pool_vote_length(&self, user: Address) -> Result<u64, ApiError>;

    /// `poolVote(user, i)` for `i in 0..count`, batched; `None` for failed reads
    async fn pool_votes(&self, user: Address, count: u64) -> Result<Vec<Option<Address>>, ApiError>;

    /// `votes(user, pool)` for each pool, batched; `None` for failed reads
    async fn vote_weights(&self, user: Address, pools: &[Address]) -> Result<Vec<Option<U256>>, ApiError>;
}

/// Contract operations the services need
#[async_trait]
pub trait VoteChain: Send + Sync {
    /// Connected account, if a signer is configured
    fn account(&self) -> Option<Address>;

    async fn get_voting_power(&self, user: Address) -> Result<VotingPowerInfo, ApiError>;

    /// Submits `vote(pools, weights)`; returns the transaction hash without waiting
    async fn execute_vote(&self, pools: &[Address], proportions: &[f64]) -> Result<String, ApiError>;

    async fn get_current_votes(&self, user: Address) -> Result<CurrentVotes, ApiError>;
}

/// Three-step current-vote read: length, pool addresses, weights.
///
/// Users who never voted cost a single call.
pub async fn get_current_votes<R>(reader: &R, user: Address) -> Result<CurrentVotes, ApiError>
where
    R: VoterReader + ?Sized,
{
    let length = reader.pool_vote_length(user).await?;
    if length == 0 {
        return Ok(CurrentVotes::default());
    }

    let pools: Vec<Address> = reader
        .pool_votes(user, length)
        .await?
        .into_iter()
        .flatten()
        .collect();
    if pools.is_empty() {
        return Ok(CurrentVotes::default());
    }

    let weights: Vec<U256> = reader
        .vote_weights(user, &pools)
        .await?
        .into_iter()
        .map(|w| w.unwrap_or(U256::ZERO))
        .collect();

    let addresses = pools.iter().map(|p| p.to_checksum(None)).collect();
    Ok(summarize_votes(addresses, weights))
}

/// Build the `VotingPowerInfo` for a raw 18-decimal value
pub fn voting_power_info(user: Address, raw: U256, timestamp: u64) -> VotingPowerInfo {
    let power = wei_to_ether(raw);
    VotingPowerInfo {
        address: user.to_checksum(None),
        voting_power: raw,
        timestamp,
        formatted_power: format!("{:.2}", power),
        power,
    }
}

/// Hydrex contracts over an HTTP provider
#[derive(Clone)]
pub struct HydrexChainClient {
    provider: DynProvider,
    addresses: ContractAddresses,
    signer_address: Option<Address>,
}

impl HydrexChainClient {
    /// Read-only client; `execute_vote` will fail
    pub fn read_only(rpc_url: &str, addresses: ContractAddresses) -> Result<Self, ApiError> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| ApiError::new(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self {
            provider,
            addresses,
            signer_address: None,
        })
    }

    pub fn with_signer(
        rpc_url: &str,
        addresses: ContractAddresses,
        private_key: &str,
    ) -> Result<Self, ApiError> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| ApiError::new(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| ApiError::new(format!("Invalid private key: {}", e)))?;
        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        info!(account = %signer_address, "wallet connected");
        Ok(Self {
            provider,
            addresses,
            signer_address: Some(signer_address),
        })
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    async fn aggregate(&self, calls: Vec<Multicall3::Call3>) -> Result<Vec<Multicall3::Result>, ApiError> {
        let multicall = Multicall3::new(self.addresses.multicall, self.provider.clone());
        multicall
            .aggregate3(calls)
            .call()
            .await
            .map_err(|e| ApiError::new(format!("Multicall failed: {}", e)))
    }
}

#[async_trait]
impl VoterReader for HydrexChainClient {
    async fn pool_vote_length(&self, user: Address) -> Result<u64, ApiError> {
        let voter = IVoter::new(self.addresses.voter, self.provider.clone());
        let length = voter
            .poolVoteLength(user)
            .call()
            .await
            .map_err(|e| ApiError::new(format!("poolVoteLength failed: {}", e)))?;
        u64::try_from(length).map_err(|_| ApiError::new(format!("poolVoteLength out of range: {}", length)))
    }

    async fn pool_votes(&self, user: Address, count: u64) -> Result<Vec<Option<Address>>, ApiError> {
        let calls = (0..count)
            .map(|index| Multicall3::Call3 {
                target: self.addresses.voter,
                allowFailure: true,
                callData: Bytes::from(
                    IVoter::poolVoteCall {
                        user,
                        index: U256::from(index),
                    }
                    .abi_encode(),
                ),
            })
            .collect();

        let results = self.aggregate(calls).await?;
        Ok(results
            .iter()
            .enumerate()
            .map(|(index, result)| {
                if !result.success {
                    warn!(%user, index, "poolVote read failed");
                    return None;
                }
                IVoter::poolVoteCall::abi_decode_returns(&result.returnData).ok()
            })
            .collect())
    }

    async fn vote_weights(&self, user: Address, pools: &[Address]) -> Result<Vec<Option<U256>>, ApiError> {
        let calls = pools
            .iter()
            .map(|pool| Multicall3::Call3 {
                target: self.addresses.voter,
                allowFailure: true,
                callData: Bytes::from(IVoter::votesCall { user, pool: *pool }.abi_encode()),
            })
            .collect();

        let results = self.aggregate(calls).await?;
        Ok(results
            .iter()
            .zip(pools)
            .map(|(result, pool)| {
                if !result.success {
                    warn!(%user, %pool, "votes read failed");
                    return None;
                }
                IVoter::votesCall::abi_decode_returns(&result.returnData).ok()
            })
            .collect())
    }
}

#[async_trait]
impl VoteChain for HydrexChainClient {
    fn account(&self) -> Option<Address> {
        self.signer_address
    }

    async fn get_voting_power(&self, user: Address) -> Result<VotingPowerInfo, ApiError> {
        let timestamp = last_thursday_timestamp(Utc::now()).max(0) as u64;
        let escrow = IVotingEscrow::new(self.addresses.voting_escrow, self.provider.clone());
        let raw = escrow
            .getPastVotes(user, U256::from(timestamp))
            .call()
            .await
            .map_err(|e| ApiError::new(format!("Failed to get voting power: {}", e)))?;

        let info = voting_power_info(user, raw, timestamp);
        debug!(%user, timestamp, power = %info.formatted_power, "voting power read");
        Ok(info)
    }

    async fn execute_vote(&self, pools: &[Address], proportions: &[f64]) -> Result<String, ApiError> {
        if self.signer_address.is_none() {
            return Err(ApiError::new("Failed to execute vote: wallet not connected"));
        }
        let weights = proportions_to_vote_weights(proportions);
        info!(pools = pools.len(), ?weights, "🚀 Submitting vote");

        let voter = IVoter::new(self.addresses.voter, self.provider.clone());
        let pending = voter
            .vote(pools.to_vec(), weights)
            .send()
            .await
            .map_err(|e| ApiError::new(format!("Failed to execute vote: {}", e)))?;
        let hash = pending.tx_hash().to_string();
        info!(tx = %hash, "✅ Vote submitted");
        Ok(hash)
    }

    async fn get_current_votes(&self, user: Address) -> Result<CurrentVotes, ApiError> {
        get_current_votes(self, user)
            .await
            .map_err(|e| ApiError::new(format!("Failed to get current votes: {}", e.message)))
    }
}
