//! Store domain - optimizer state and the actions that mutate it

pub mod optimizer_state;
pub mod optimizer_store;

pub use optimizer_state::{OptimizerState, POOL_COUNT_RANGE};
pub use optimizer_store::{OptimizerStore, SharedStore, StateChange, SubscriptionId};
