//! Optimizer store - owned state plus the action set that mutates it

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::optimizer_state::OptimizerState;
use crate::shared::types::{
    ChainType, MultiOptimizationEntry, OptimizationResult, Pool, VotingPowerInfo,
};

/// Store shared between the CLI, services and the simulation trigger
pub type SharedStore = Arc<RwLock<OptimizerStore>>;

/// What an action touched, passed to every listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Chain,
    VotingPower,
    Selection,
    Allocation,
    Blacklist,
    Pools,
    Results,
    Settings,
    Status,
    Wallet,
    Reset,
}

impl StateChange {
    /// Changes the real-time simulation reacts to
    pub fn affects_simulation(&self) -> bool {
        matches!(
            self,
            StateChange::Chain
                | StateChange::VotingPower
                | StateChange::Selection
                | StateChange::Allocation
                | StateChange::Reset
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&OptimizerState, StateChange) + Send + Sync>;

pub struct OptimizerStore {
    state: OptimizerState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for OptimizerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for OptimizerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerStore {
    pub fn new() -> Self {
        Self::with_state(OptimizerState::default())
    }

    pub fn with_state(state: OptimizerState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn state(&self) -> &OptimizerState {
        &self.state
    }

    /// Register a listener called after every action
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&OptimizerState, StateChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, change: StateChange) {
        debug!(?change, listeners = self.listeners.len(), "store updated");
        for (_, listener) in &self.listeners {
            listener(&self.state, change);
        }
    }

    // ----- selections -----

    pub fn set_chain(&mut self, chain: ChainType) {
        // Pools and results are chain scoped
        self.state.selected_chain = chain;
        self.state.all_pools.clear();
        self.state.current_simulation = None;
        self.state.current_optimization = None;
        self.state.multi_optimization_results.clear();
        self.notify(StateChange::Chain);
    }

    /// Replaces voting power and invalidates the simulation only
    pub fn set_voting_power(&mut self, power: f64) {
        self.state.voting_power = power;
        self.state.current_simulation = None;
        self.notify(StateChange::VotingPower);
    }

    pub fn set_selected_pools(&mut self, pools: Vec<String>) {
        self.state
            .pool_allocations
            .retain(|address, _| pools.contains(address));
        self.state.selected_pools = pools;
        self.notify(StateChange::Selection);
    }

    pub fn toggle_pool_selection(&mut self, pool_address: &str) {
        if let Some(idx) = self
            .state
            .selected_pools
            .iter()
            .position(|p| p == pool_address)
        {
            self.state.selected_pools.remove(idx);
            self.state.pool_allocations.remove(pool_address);
        } else {
            self.state.selected_pools.push(pool_address.to_string());
        }
        self.notify(StateChange::Selection);
    }

    /// Upserts one entry, no range check and no re-normalization
    pub fn set_pool_allocation(&mut self, pool_address: &str, percentage: f64) {
        self.state
            .pool_allocations
            .insert(pool_address.to_string(), percentage);
        self.notify(StateChange::Allocation);
    }

    /// Advisory only: the optimizer excludes blacklisted pools, nothing here does
    pub fn toggle_blacklist(&mut self, pool_address: &str) {
        if !self.state.blacklisted_pools.remove(pool_address) {
            self.state
                .blacklisted_pools
                .insert(pool_address.to_string());
        }
        self.notify(StateChange::Blacklist);
    }

    pub fn set_max_pools(&mut self, max_pools: u32) {
        self.state.max_pools = max_pools;
        self.notify(StateChange::Settings);
    }

    pub fn set_min_pools(&mut self, min_pools: u32) {
        self.state.min_pools = min_pools;
        self.notify(StateChange::Settings);
    }

    pub fn set_max_pools_advanced(&mut self, max_pools_advanced: u32) {
        self.state.max_pools_advanced = max_pools_advanced;
        self.notify(StateChange::Settings);
    }

    // ----- fetched data -----

    pub fn set_all_pools(&mut self, pools: Vec<Pool>) {
        self.state.all_pools = pools;
        self.notify(StateChange::Pools);
    }

    pub fn set_simulation(&mut self, result: Option<OptimizationResult>) {
        self.state.current_simulation = result;
        self.notify(StateChange::Results);
    }

    pub fn set_optimization(&mut self, result: Option<OptimizationResult>) {
        self.state.current_optimization = result;
        self.notify(StateChange::Results);
    }

    pub fn set_multi_optimization_results(&mut self, results: Vec<MultiOptimizationEntry>) {
        self.state.multi_optimization_results = results;
        self.notify(StateChange::Results);
    }

    /// Replaces selection and allocations wholesale from an optimizer result.
    /// A pool count of zero means "not recorded".
    pub fn apply_optimal_allocations(&mut self, result: OptimizationResult, max_pools: Option<u32>) {
        let mut selected = Vec::with_capacity(result.allocations.len());
        self.state.pool_allocations.clear();
        for allocation in &result.allocations {
            if !selected.contains(&allocation.pool_address) {
                selected.push(allocation.pool_address.clone());
            }
            self.state
                .pool_allocations
                .insert(allocation.pool_address.clone(), allocation.vote_percentage);
        }
        self.state.selected_pools = selected;
        self.state.current_optimization = Some(result);
        self.state.applied_result_max_pools = max_pools.filter(|count| *count > 0);
        self.notify(StateChange::Selection);
    }

    // ----- status -----

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.notify(StateChange::Status);
    }

    /// Setting an error also ends any loading phase
    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
        self.state.is_loading = false;
        self.notify(StateChange::Status);
    }

    pub fn reset(&mut self) {
        self.state = OptimizerState::default();
        self.notify(StateChange::Reset);
    }

    // ----- wallet -----

    pub fn set_wallet_connected(&mut self, connected: bool) {
        self.state.wallet_connected = connected;
        self.notify(StateChange::Wallet);
    }

    pub fn set_user_address(&mut self, address: Option<String>) {
        self.state.user_address = address;
        self.notify(StateChange::Wallet);
    }

    pub fn set_blockchain_voting_power(&mut self, power: Option<VotingPowerInfo>) {
        self.state.blockchain_voting_power = power;
        self.notify(StateChange::Wallet);
    }

    pub fn set_voting_power_loading(&mut self, loading: bool) {
        self.state.is_voting_power_loading = loading;
        self.notify(StateChange::Wallet);
    }

    pub fn set_voting(&mut self, voting: bool) {
        self.state.is_voting = voting;
        self.notify(StateChange::Status);
    }
}
