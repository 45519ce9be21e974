//! Application layer - use cases and services

pub mod commands;
pub mod notifications;
pub mod realtime_simulation;
pub mod services;

#[cfg(test)]
mod test_support;

pub use commands::{Cli, CommandExecutor, Commands};
pub use notifications::{Notification, Notifier, TracingNotifier};
pub use realtime_simulation::{SimulationTrigger, TriggerConfig};
pub use services::{CurrentVoteReport, OptimizerService};
