//! Infrastructure layer - HTTP and chain clients

pub mod api;
pub mod blockchain;
