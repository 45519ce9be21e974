//! Application services and use cases

use alloy::primitives::Address;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::notifications::Notifier;
use crate::domain::allocation::{best_entry, pool_count_range, rank_by_expected_return, rebalance_to_full_weight};
use crate::domain::store::{SharedStore, POOL_COUNT_RANGE};
use crate::infrastructure::api::OptimizerApi;
use crate::infrastructure::blockchain::VoteChain;
use crate::shared::errors::ApiError;
use crate::shared::types::{
    CurrentVotes, MultiOptimizationEntry, OptimizationResult, Pool, SimulationRequest,
    VotingPowerInfo,
};
use crate::shared::utils::{shorten_tx_hash, ALLOCATION_TOLERANCE};

/// What `load_current_votes` found on chain, plus simulated earnings
#[derive(Debug, Clone, Default)]
pub struct CurrentVoteReport {
    pub votes: CurrentVotes,
    pub simulated_earnings: Option<OptimizationResult>,
}

/// Use cases driving the store from user actions
pub struct OptimizerService {
    store: SharedStore,
    api: Arc<dyn OptimizerApi>,
    chain: Option<Arc<dyn VoteChain>>,
    notifier: Arc<dyn Notifier>,
}

impl OptimizerService {
    pub fn new(
        store: SharedStore,
        api: Arc<dyn OptimizerApi>,
        chain: Option<Arc<dyn VoteChain>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            api,
            chain,
            notifier,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Validation failures only reach the user, never the store
    fn reject(&self, message: &str) -> ApiError {
        self.notifier.error(message);
        ApiError::new(message)
    }

    /// Remote failures go to both the store and the user
    async fn fail(&self, err: ApiError) -> ApiError {
        self.store.write().await.set_error(Some(err.message.clone()));
        self.notifier.error(&err.message);
        err
    }

    fn chain_client(&self) -> Option<&Arc<dyn VoteChain>> {
        self.chain.as_ref()
    }

    /// Mark the wallet as connected for `address`
    pub async fn connect_wallet(&self, address: Address) {
        let mut store = self.store.write().await;
        store.set_wallet_connected(true);
        store.set_user_address(Some(address.to_checksum(None)));
    }

    pub async fn disconnect_wallet(&self) {
        let mut store = self.store.write().await;
        store.set_wallet_connected(false);
        store.set_user_address(None);
        store.set_blockchain_voting_power(None);
    }

    pub async fn load_pools(&self) -> Result<Vec<Pool>, ApiError> {
        let chain = {
            let mut store = self.store.write().await;
            store.set_loading(true);
            store.state().selected_chain
        };

        match self.api.fetch_pools(chain).await {
            Ok(pools) => {
                let mut store = self.store.write().await;
                store.set_all_pools(pools.clone());
                store.set_loading(false);
                Ok(pools)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    /// Manual simulation of the current allocation
    pub async fn simulate(&self) -> Result<OptimizationResult, ApiError> {
        let (chain, request) = {
            let store = self.store.read().await;
            let state = store.state();
            if state.selected_pools.is_empty() {
                return Err(self.reject("Please select at least one pool"));
            }
            if (state.total_allocation() - 100.0).abs() > ALLOCATION_TOLERANCE {
                return Err(self.reject("Pool allocations must sum to 100%"));
            }
            if state.voting_power <= 0.0 {
                return Err(self.reject("Please enter a valid voting power"));
            }
            (
                state.selected_chain,
                SimulationRequest {
                    pools: state.selected_pools.clone(),
                    weights: state.selected_weights_bps(),
                    voting_power: state.voting_power,
                },
            )
        };

        match self.api.simulate_vote(chain, &request).await {
            Ok(result) => {
                let mut store = self.store.write().await;
                store.set_simulation(Some(result.clone()));
                store.set_optimization(None);
                store.set_multi_optimization_results(Vec::new());
                drop(store);
                self.notifier.success("Simulation completed successfully");
                Ok(result)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    /// Single optimizer run with the configured pool cap
    pub async fn optimize(&self) -> Result<OptimizationResult, ApiError> {
        let (voting_power, max_pools, chain, blacklist) = {
            let store = self.store.read().await;
            let state = store.state();
            if state.voting_power <= 0.0 {
                return Err(self.reject("Please enter a valid voting power"));
            }
            if !POOL_COUNT_RANGE.contains(&state.max_pools) {
                return Err(self.reject(&pool_count_message()));
            }
            (
                state.voting_power,
                state.max_pools,
                state.selected_chain,
                state.blacklist(),
            )
        };

        match self
            .api
            .get_optimal_allocation(voting_power, max_pools, chain, &blacklist)
            .await
        {
            Ok(result) => {
                let mut store = self.store.write().await;
                store.set_optimization(Some(result.clone()));
                store.set_simulation(None);
                store.set_multi_optimization_results(Vec::new());
                store.apply_optimal_allocations(result.clone(), None);
                drop(store);
                self.notifier.success("Optimization completed successfully");
                Ok(result)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    /// One optimizer run per pool count in `[min_pools, max_pools_advanced]`,
    /// applying the best one. Fails as a whole if any run fails.
    pub async fn multi_optimize(&self) -> Result<Vec<MultiOptimizationEntry>, ApiError> {
        let (voting_power, range, chain, blacklist) = {
            let store = self.store.read().await;
            let state = store.state();
            if state.voting_power <= 0.0 {
                return Err(self.reject("Please enter a valid voting power"));
            }
            if !POOL_COUNT_RANGE.contains(&state.min_pools)
                || !POOL_COUNT_RANGE.contains(&state.max_pools_advanced)
            {
                return Err(self.reject(&pool_count_message()));
            }
            if state.min_pools > state.max_pools_advanced {
                return Err(self.reject("Pool count range is empty"));
            }
            (
                state.voting_power,
                pool_count_range(state.min_pools, state.max_pools_advanced),
                state.selected_chain,
                state.blacklist(),
            )
        };

        info!(
            min = range.start(),
            max = range.end(),
            %chain,
            "🔍 Running advanced optimization"
        );

        let requests = range.map(|max_pools| {
            let api = Arc::clone(&self.api);
            let blacklist = blacklist.clone();
            async move {
                api.get_optimal_allocation(voting_power, max_pools, chain, &blacklist)
                    .await
                    .map(|result| MultiOptimizationEntry { max_pools, result })
            }
        });

        let entries = match try_join_all(requests).await {
            Ok(entries) => entries,
            Err(err) => return Err(self.fail(err).await),
        };

        let ranked = rank_by_expected_return(&entries);
        let Some(best) = best_entry(&ranked) else {
            return Err(self.reject("Advanced optimization returned no results"));
        };

        let mut store = self.store.write().await;
        store.set_multi_optimization_results(ranked.clone());
        store.set_optimization(Some(best.result.clone()));
        store.apply_optimal_allocations(best.result.clone(), Some(best.max_pools));
        drop(store);

        info!(
            best_pools = best.max_pools,
            expected_return = best.result.total_expected_return,
            "advanced optimization applied"
        );
        self.notifier.success("Multi-optimization completed successfully");
        Ok(ranked)
    }

    /// Submit the current allocation on chain
    pub async fn vote(&self) -> Result<String, ApiError> {
        let (pools, proportions) = {
            let store = self.store.read().await;
            let state = store.state();
            if !state.wallet_connected {
                return Err(self.reject("Please connect your wallet first"));
            }
            if state.selected_pools.is_empty() {
                return Err(self.reject("Please select at least one pool to vote for"));
            }
            if (state.total_allocation() - 100.0).abs() > ALLOCATION_TOLERANCE {
                return Err(self.reject("Pool allocations must sum to 100%"));
            }
            (state.selected_pools.clone(), state.selected_proportions())
        };

        let Some(chain) = self.chain_client().cloned() else {
            return Err(self.reject("Please connect your wallet first"));
        };

        {
            let mut store = self.store.write().await;
            store.set_voting(true);
            store.set_error(None);
        }

        let outcome = match parse_addresses(&pools) {
            Ok(addresses) => chain.execute_vote(&addresses, &proportions).await,
            Err(err) => Err(err),
        };
        self.store.write().await.set_voting(false);

        match outcome {
            Ok(hash) => {
                self.notifier.success(&format!(
                    "Vote submitted successfully! Transaction: {}",
                    shorten_tx_hash(&hash)
                ));
                Ok(hash)
            }
            Err(err) => {
                self.store.write().await.set_error(Some(err.message.clone()));
                self.notifier.error(&format!("Vote failed: {}", err.message));
                Err(err)
            }
        }
    }

    /// Reads voting power at the last epoch boundary and adopts it
    pub async fn refresh_voting_power(&self) -> Result<VotingPowerInfo, ApiError> {
        let user = self.connected_user().await?;
        let Some(chain) = self.chain_client().cloned() else {
            return Err(ApiError::new("Failed to get voting power: no chain client"));
        };

        self.store.write().await.set_voting_power_loading(true);
        let outcome = chain.get_voting_power(user).await;

        let mut store = self.store.write().await;
        store.set_voting_power_loading(false);
        match outcome {
            Ok(info) => {
                store.set_blockchain_voting_power(Some(info.clone()));
                store.set_voting_power(info.power);
                Ok(info)
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch voting power");
                Err(err)
            }
        }
    }

    /// Existing on-chain votes, simulated at the current voting power
    pub async fn load_current_votes(&self) -> Result<CurrentVoteReport, ApiError> {
        let user = match self.connected_user().await {
            Ok(user) => user,
            Err(_) => return Ok(CurrentVoteReport::default()),
        };
        let Some(chain) = self.chain_client().cloned() else {
            return Ok(CurrentVoteReport::default());
        };

        let votes = chain.get_current_votes(user).await?;
        if votes.is_empty() {
            return Ok(CurrentVoteReport::default());
        }

        let (voting_power, selected_chain) = {
            let store = self.store.read().await;
            (store.state().voting_power, store.state().selected_chain)
        };

        let mut simulated_earnings = None;
        if voting_power > 0.0 {
            if let Some(weights) = rebalance_to_full_weight(&votes.percentages) {
                let request = SimulationRequest {
                    pools: votes.pool_addresses.clone(),
                    weights,
                    voting_power,
                };
                match self.api.simulate_vote(selected_chain, &request).await {
                    Ok(result) => simulated_earnings = Some(result),
                    Err(err) => warn!(error = %err, "failed to simulate current votes"),
                }
            }
        }

        Ok(CurrentVoteReport {
            votes,
            simulated_earnings,
        })
    }

    pub async fn reset(&self) {
        self.store.write().await.reset();
        self.notifier.success("Configuration reset");
    }

    async fn connected_user(&self) -> Result<Address, ApiError> {
        let store = self.store.read().await;
        let state = store.state();
        match (&state.user_address, state.wallet_connected) {
            (Some(address), true) => address
                .parse()
                .map_err(|e| ApiError::new(format!("Invalid wallet address {}: {}", address, e))),
            _ => Err(ApiError::new("Wallet not connected")),
        }
    }
}

fn pool_count_message() -> String {
    format!(
        "Pool count must be between {} and {}",
        POOL_COUNT_RANGE.start(),
        POOL_COUNT_RANGE.end()
    )
}

fn parse_addresses(pools: &[String]) -> Result<Vec<Address>, ApiError> {
    pools
        .iter()
        .map(|pool| {
            pool.parse::<Address>()
                .map_err(|e| ApiError::new(format!("Invalid pool address {}: {}", pool, e)))
        })
        .collect()
}
