//! Pool domain - chain-scoped pool listings

mod pool_manager;

pub use pool_manager::{total_rewards, PoolManager, PoolSort, DEFAULT_MIN_REWARDS};
