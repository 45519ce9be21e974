//! Hand-written client doubles shared by the application tests

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::infrastructure::api::OptimizerApi;
use crate::infrastructure::blockchain::VoteChain;
use crate::infrastructure::blockchain::voter_client::voting_power_info;
use crate::shared::errors::ApiError;
use crate::shared::types::{
    ChainType, CurrentVotes, OptimizationResult, Pool, SimulationRequest, VoteAllocation,
    VotingPowerInfo,
};

pub fn allocation(address: &str, pct: f64) -> VoteAllocation {
    VoteAllocation {
        pool_address: address.to_string(),
        pool_name: format!("pool {}", address),
        vote_percentage: pct,
        ..Default::default()
    }
}

/// Even split over `n` pools named 0xP1..0xPn
pub fn even_result(n: u32, total: f64) -> OptimizationResult {
    let pct = 100.0 / n as f64;
    OptimizationResult {
        allocations: (1..=n).map(|i| allocation(&format!("0xP{}", i), pct)).collect(),
        total_expected_return: total,
        ..Default::default()
    }
}

pub struct MockApi {
    pub pools: Vec<Pool>,
    pub simulation: Mutex<Result<OptimizationResult, ApiError>>,
    /// expected return per pool count; missing counts return 0
    pub returns_by_pool_count: HashMap<u32, f64>,
    pub fail_pool_counts: HashSet<u32>,
    /// simulate responses resolve after this long
    pub simulate_delay: Option<Duration>,
    pub simulate_calls: Mutex<Vec<(ChainType, SimulationRequest)>>,
    pub optimize_calls: Mutex<Vec<(f64, u32, ChainType, Vec<String>)>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            pools: Vec::new(),
            simulation: Mutex::new(Ok(OptimizationResult {
                total_expected_return: 123.0,
                ..Default::default()
            })),
            returns_by_pool_count: HashMap::new(),
            fail_pool_counts: HashSet::new(),
            simulate_delay: None,
            simulate_calls: Mutex::new(Vec::new()),
            optimize_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    pub fn failing_simulation(message: &str, status: u16) -> Self {
        let api = Self::default();
        *api.simulation.lock().unwrap() = Err(ApiError::with_status(message, status));
        api
    }

    pub fn simulate_count(&self) -> usize {
        self.simulate_calls.lock().unwrap().len()
    }

    pub fn last_simulation(&self) -> Option<(ChainType, SimulationRequest)> {
        self.simulate_calls.lock().unwrap().last().cloned()
    }

    pub fn optimize_count(&self) -> usize {
        self.optimize_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OptimizerApi for MockApi {
    async fn fetch_pools(&self, chain: ChainType) -> Result<Vec<Pool>, ApiError> {
        Ok(self
            .pools
            .iter()
            .filter(|p| p.chain_id == chain.chain_id())
            .cloned()
            .collect())
    }

    async fn fetch_all_pools(&self) -> Result<Vec<Pool>, ApiError> {
        Ok(self.pools.clone())
    }

    async fn simulate_vote(
        &self,
        chain: ChainType,
        request: &SimulationRequest,
    ) -> Result<OptimizationResult, ApiError> {
        self.simulate_calls
            .lock()
            .unwrap()
            .push((chain, request.clone()));
        let result = self.simulation.lock().unwrap().clone();
        if let Some(delay) = self.simulate_delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_optimal_allocation(
        &self,
        voting_power: f64,
        max_pools: u32,
        chain: ChainType,
        blacklist: &[String],
    ) -> Result<OptimizationResult, ApiError> {
        self.optimize_calls
            .lock()
            .unwrap()
            .push((voting_power, max_pools, chain, blacklist.to_vec()));
        if self.fail_pool_counts.contains(&max_pools) {
            return Err(ApiError::with_status("Optimization failed: solver timeout", 504));
        }
        let total = self
            .returns_by_pool_count
            .get(&max_pools)
            .copied()
            .unwrap_or(0.0);
        Ok(even_result(max_pools, total))
    }
}

pub struct MockChain {
    pub account: Option<Address>,
    pub power: U256,
    pub votes: CurrentVotes,
    pub vote_result: Result<String, ApiError>,
    pub vote_calls: Mutex<Vec<(Vec<Address>, Vec<f64>)>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            account: None,
            power: U256::ZERO,
            votes: CurrentVotes::default(),
            vote_result: Ok(format!("0x{}", "ab".repeat(32))),
            vote_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VoteChain for MockChain {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn get_voting_power(&self, user: Address) -> Result<VotingPowerInfo, ApiError> {
        Ok(voting_power_info(user, self.power, 1_760_486_400))
    }

    async fn execute_vote(&self, pools: &[Address], proportions: &[f64]) -> Result<String, ApiError> {
        self.vote_calls
            .lock()
            .unwrap()
            .push((pools.to_vec(), proportions.to_vec()));
        self.vote_result.clone()
    }

    async fn get_current_votes(&self, _user: Address) -> Result<CurrentVotes, ApiError> {
        Ok(self.votes.clone())
    }
}
