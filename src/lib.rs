//! vevote - veToken vote allocation optimizer
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{OptimizerService, SimulationTrigger};
pub use domain::pool::PoolManager;
pub use domain::store::{OptimizerStore, SharedStore};
pub use infrastructure::api::{HttpOptimizerClient, OptimizerApi};
pub use infrastructure::blockchain::{HydrexChainClient, VoteChain};
