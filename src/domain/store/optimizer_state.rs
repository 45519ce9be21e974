//! Snapshot of everything the optimizer UI knows

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use crate::shared::types::{
    ChainType, MultiOptimizationEntry, OptimizationResult, Pool, VotingPowerInfo,
};
use crate::shared::utils::{is_allocation_complete, percentage_to_basis_points};

pub const DEFAULT_VOTING_POWER: f64 = 1_600_000.0;
pub const DEFAULT_MAX_POOLS: u32 = 5;
pub const DEFAULT_MIN_POOLS: u32 = 1;
pub const DEFAULT_MAX_POOLS_ADVANCED: u32 = 10;
/// Pool counts the optimizer accepts
pub const POOL_COUNT_RANGE: RangeInclusive<u32> = 1..=20;

/// Single source of truth for user selections and fetched results
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState {
    // Current selections
    pub selected_chain: ChainType,
    pub voting_power: f64,
    /// Ordered, unique pool addresses
    pub selected_pools: Vec<String>,
    /// pool address -> percentage (0-100)
    pub pool_allocations: BTreeMap<String, f64>,
    pub max_pools: u32,
    pub min_pools: u32,
    pub max_pools_advanced: u32,

    // Data from APIs
    pub all_pools: Vec<Pool>,
    pub current_simulation: Option<OptimizationResult>,
    pub current_optimization: Option<OptimizationResult>,
    pub multi_optimization_results: Vec<MultiOptimizationEntry>,
    pub applied_result_max_pools: Option<u32>,

    pub blacklisted_pools: BTreeSet<String>,

    // Wallet
    pub wallet_connected: bool,
    pub user_address: Option<String>,
    pub blockchain_voting_power: Option<VotingPowerInfo>,
    pub is_voting_power_loading: bool,
    pub is_voting: bool,

    // Status
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for OptimizerState {
    fn default() -> Self {
        Self {
            selected_chain: ChainType::Base,
            voting_power: DEFAULT_VOTING_POWER,
            selected_pools: Vec::new(),
            pool_allocations: BTreeMap::new(),
            max_pools: DEFAULT_MAX_POOLS,
            min_pools: DEFAULT_MIN_POOLS,
            max_pools_advanced: DEFAULT_MAX_POOLS_ADVANCED,
            all_pools: Vec::new(),
            current_simulation: None,
            current_optimization: None,
            multi_optimization_results: Vec::new(),
            applied_result_max_pools: None,
            blacklisted_pools: BTreeSet::new(),
            wallet_connected: false,
            user_address: None,
            blockchain_voting_power: None,
            is_voting_power_loading: false,
            is_voting: false,
            is_loading: false,
            error: None,
        }
    }
}

impl OptimizerState {
    /// Sum of every allocation entry, selected or not
    pub fn total_allocation(&self) -> f64 {
        self.pool_allocations.values().sum()
    }

    pub fn is_allocation_complete(&self) -> bool {
        is_allocation_complete(self.total_allocation())
    }

    /// Ready for an automatic simulation
    pub fn can_simulate(&self) -> bool {
        !self.selected_pools.is_empty() && self.voting_power > 0.0 && self.is_allocation_complete()
    }

    pub fn allocation_for(&self, pool_address: &str) -> f64 {
        self.pool_allocations.get(pool_address).copied().unwrap_or(0.0)
    }

    /// Percentages of the selected pools in selection order, missing = 0
    pub fn selected_proportions(&self) -> Vec<f64> {
        self.selected_pools
            .iter()
            .map(|pool| self.allocation_for(pool))
            .collect()
    }

    /// Basis-point weights of the selected pools in selection order
    pub fn selected_weights_bps(&self) -> Vec<u32> {
        self.selected_proportions()
            .into_iter()
            .map(percentage_to_basis_points)
            .collect()
    }

    pub fn blacklist(&self) -> Vec<String> {
        self.blacklisted_pools.iter().cloned().collect()
    }

    pub fn is_blacklisted(&self, pool_address: &str) -> bool {
        self.blacklisted_pools.contains(pool_address)
    }
}
