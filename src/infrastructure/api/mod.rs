pub mod optimizer_client;

pub use optimizer_client::{HttpOptimizerClient, DEFAULT_API_BASE_URL, DEFAULT_POOLS_URL};

use async_trait::async_trait;

use crate::shared::errors::ApiError;
use crate::shared::types::{ChainType, OptimizationResult, Pool, SimulationRequest};

/// Remote pool listing and optimizer endpoints
#[async_trait]
pub trait OptimizerApi: Send + Sync {
    /// Pools of one chain, filtered client-side
    async fn fetch_pools(&self, chain: ChainType) -> Result<Vec<Pool>, ApiError>;

    /// Every pool the listing returns, all chains
    async fn fetch_all_pools(&self) -> Result<Vec<Pool>, ApiError>;

    /// Expected returns for a fixed allocation; weights must sum to 10000
    async fn simulate_vote(
        &self,
        chain: ChainType,
        request: &SimulationRequest,
    ) -> Result<OptimizationResult, ApiError>;

    /// Optimal allocation over at most `max_pools` pools, skipping the blacklist
    async fn get_optimal_allocation(
        &self,
        voting_power: f64,
        max_pools: u32,
        chain: ChainType,
        blacklist: &[String],
    ) -> Result<OptimizationResult, ApiError>;
}
