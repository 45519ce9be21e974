//! Domain layer - core business logic and entities

pub mod allocation;
pub mod pool;
pub mod store;
