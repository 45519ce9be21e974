//! CLI commands and handlers
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::application::realtime_simulation::{SimulationTrigger, TriggerConfig};
use crate::application::services::OptimizerService;
use crate::domain::pool::{total_rewards, PoolManager, PoolSort, DEFAULT_MIN_REWARDS};
use crate::domain::store::{StateChange, POOL_COUNT_RANGE};
use crate::infrastructure::api::OptimizerApi;
use crate::shared::errors::ApiError;
use crate::shared::types::{ChainType, OptimizationResult};
use crate::shared::utils::{
    format_currency, format_large_number, format_percentage, shorten_tx_hash,
};

#[derive(Parser, Debug)]
#[command(name = "vevote")]
#[command(version, about = "veToken vote allocation optimizer")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command; they override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Optimizer API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Pool listing URL
    #[arg(long, global = true)]
    pub pools_url: Option<String>,

    /// EVM RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Chain (base, linea, polygon, unichain, ethereum, arbitrum)
    #[arg(long, global = true)]
    pub chain: Option<ChainType>,

    /// Voting power used for simulation and optimization
    #[arg(long, global = true)]
    pub voting_power: Option<f64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List pools of the selected chain
    Pools {
        /// Show gauge details
        #[arg(long)]
        detailed: bool,

        /// List every chain instead of the selected one
        #[arg(long)]
        all_chains: bool,

        /// Limit number of pools to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Hide pools with less annual rewards (fees + bribes, USD)
        #[arg(long, default_value_t = DEFAULT_MIN_REWARDS)]
        min_rewards: f64,

        /// Sort by rewards, apr, tvl or title
        #[arg(long, default_value_t = PoolSort::Rewards)]
        sort: PoolSort,

        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
    },

    /// Simulate a fixed allocation, e.g. `--pool 0xabc=60 --pool 0xdef=40`
    Simulate {
        #[arg(long = "pool", value_parser = parse_allocation, required = true)]
        allocations: Vec<(String, f64)>,
    },

    /// Ask the optimizer for the best allocation
    Optimize {
        /// Maximum number of pools in the result (1-20)
        #[arg(long, value_parser = pool_count)]
        max_pools: Option<u32>,

        /// Pools the optimizer must skip
        #[arg(long)]
        blacklist: Vec<String>,
    },

    /// Optimize for every pool count in a range and apply the best
    MultiOptimize {
        /// Smallest pool count tried (1-20)
        #[arg(long, value_parser = pool_count)]
        min_pools: Option<u32>,

        /// Largest pool count tried (1-20)
        #[arg(long, value_parser = pool_count)]
        max_pools: Option<u32>,

        #[arg(long)]
        blacklist: Vec<String>,
    },

    /// Voting power at the last epoch boundary
    VotingPower {
        /// Address to query instead of the configured wallet
        #[arg(long)]
        address: Option<String>,
    },

    /// Votes already cast on chain, with simulated earnings
    CurrentVotes {
        #[arg(long)]
        address: Option<String>,
    },

    /// Submit a vote; without `--pool` the optimizer result is used
    Vote {
        #[arg(long = "pool", value_parser = parse_allocation)]
        allocations: Vec<(String, f64)>,

        /// Only print what would be submitted
        #[arg(long)]
        dry_run: bool,
    },

    /// Edit an allocation from stdin and re-simulate while typing
    Watch {
        /// Quiet period before a simulation fires (ms)
        #[arg(long)]
        quiet_ms: Option<u64>,
    },
}

fn pool_count(s: &str) -> Result<u32, String> {
    let count: u32 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid pool count '{}': {}", s, e))?;
    if !POOL_COUNT_RANGE.contains(&count) {
        return Err(format!(
            "pool count must be between {} and {}",
            POOL_COUNT_RANGE.start(),
            POOL_COUNT_RANGE.end()
        ));
    }
    Ok(count)
}

/// `address=percentage`
pub fn parse_allocation(s: &str) -> Result<(String, f64), String> {
    let (address, pct) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <address>=<percentage>, got '{}'", s))?;
    let address = address.trim();
    if address.is_empty() {
        return Err(format!("missing pool address in '{}'", s));
    }
    let pct: f64 = pct
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|e| format!("invalid percentage in '{}': {}", s, e))?;
    if !(0.0..=100.0).contains(&pct) {
        return Err(format!("percentage out of range in '{}'", s));
    }
    Ok((address.to_string(), pct))
}

/// One line typed into `watch`
#[derive(Debug, Clone, PartialEq)]
pub enum WatchInput {
    Allocate(String, f64),
    Deselect(String),
    VotingPower(f64),
    Chain(ChainType),
    Show,
    Reset,
    Quit,
}

impl WatchInput {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("quit" | "exit"), None) => Ok(Self::Quit),
            (Some("show"), None) => Ok(Self::Show),
            (Some("reset"), None) => Ok(Self::Reset),
            (Some("power"), Some(value)) => value
                .parse()
                .map(Self::VotingPower)
                .map_err(|e| format!("invalid voting power '{}': {}", value, e)),
            (Some("chain"), Some(value)) => value
                .parse()
                .map(Self::Chain)
                .map_err(|e: ApiError| e.message),
            (Some(word), None) if word.starts_with('-') => {
                Ok(Self::Deselect(word.trim_start_matches('-').to_string()))
            }
            (Some(word), None) => {
                parse_allocation(word).map(|(address, pct)| Self::Allocate(address, pct))
            }
            _ => Err(format!("unrecognized input '{}'", line)),
        }
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(
        command: Commands,
        service: Arc<OptimizerService>,
        api: Arc<dyn OptimizerApi>,
        trigger_config: TriggerConfig,
    ) -> Result<(), ApiError> {
        match command {
            Commands::Pools {
                detailed,
                all_chains,
                limit,
                min_rewards,
                sort,
                asc,
            } => {
                let pools = if all_chains {
                    info!("🔍 Fetching pools on all chains...");
                    api.fetch_all_pools().await?
                } else {
                    let chain = service.store().read().await.state().selected_chain;
                    info!("🔍 Fetching pools on {}...", chain);
                    service.load_pools().await?
                };
                let manager = PoolManager::new(pools);
                Self::execute_pools_command(&manager, detailed, limit, min_rewards, sort, asc);
                Ok(())
            }
            Commands::Simulate { allocations } => {
                Self::apply_allocations(&service, &allocations).await;
                let result = service.simulate().await?;
                log_result("Simulation", &result);
                Ok(())
            }
            Commands::Optimize { max_pools, blacklist } => {
                {
                    let mut store = service.store().write().await;
                    if let Some(max_pools) = max_pools {
                        store.set_max_pools(max_pools);
                    }
                    for pool in &blacklist {
                        if !store.state().is_blacklisted(pool) {
                            store.toggle_blacklist(pool);
                        }
                    }
                }
                let result = service.optimize().await?;
                log_result("Optimal allocation", &result);
                Ok(())
            }
            Commands::MultiOptimize {
                min_pools,
                max_pools,
                blacklist,
            } => {
                Self::execute_multi_optimize_command(&service, min_pools, max_pools, blacklist).await
            }
            Commands::VotingPower { address } => {
                Self::use_address(&service, address).await?;
                let info = service.refresh_voting_power().await?;
                info!("📊 Voting power of {}", info.address);
                info!("   Snapshot: {}", info.timestamp);
                info!("   Power: {} veTokens", info.formatted_power);
                Ok(())
            }
            Commands::CurrentVotes { address } => {
                Self::use_address(&service, address).await?;
                Self::execute_current_votes_command(&service, api.as_ref()).await
            }
            Commands::Vote {
                allocations,
                dry_run,
            } => Self::execute_vote_command(&service, allocations, dry_run).await,
            Commands::Watch { quiet_ms } => {
                let config = TriggerConfig {
                    quiet_period_ms: quiet_ms.unwrap_or(trigger_config.quiet_period_ms),
                };
                Self::execute_watch_command(service, api, config).await
            }
        }
    }

    async fn apply_allocations(service: &OptimizerService, allocations: &[(String, f64)]) {
        let mut store = service.store().write().await;
        store.set_selected_pools(allocations.iter().map(|(address, _)| address.clone()).collect());
        for (address, pct) in allocations {
            store.set_pool_allocation(address, *pct);
        }
    }

    /// Point the wallet at `address` for read-only queries
    async fn use_address(service: &OptimizerService, address: Option<String>) -> Result<(), ApiError> {
        if let Some(address) = address {
            let parsed = address
                .parse()
                .map_err(|e| ApiError::new(format!("Invalid address {}: {}", address, e)))?;
            service.connect_wallet(parsed).await;
        }
        Ok(())
    }

    /// Execute pools command
    fn execute_pools_command(
        manager: &PoolManager,
        detailed: bool,
        limit: usize,
        min_rewards: f64,
        sort: PoolSort,
        ascending: bool,
    ) {
        let pools = manager.listing(min_rewards, sort, ascending);
        info!(
            "   Found {} pools, {} with at least {} in rewards (showing {}, by {} {})",
            manager.get_pools().len(),
            pools.len(),
            format_currency(min_rewards),
            pools.len().min(limit),
            sort,
            if ascending { "asc" } else { "desc" }
        );

        for (i, pool) in pools.iter().take(limit).enumerate() {
            info!(
                "   {}. {} ({}) rewards {}",
                i + 1,
                pool.title,
                pool.address,
                format_large_number(total_rewards(pool))
            );
            if detailed {
                info!("      Fees: {}", format_currency(pool.gauge.fee_in_usd));
                info!("      Bribes: {}", format_currency(pool.gauge.bribes_in_usd));
                info!("      TVL: {}", format_large_number(pool.gauge.tvl));
                info!("      APR: {}", format_percentage(pool.gauge.apr));
                info!("      Voting APR: {}", format_percentage(pool.gauge.voting_apr_projection));
                info!("      Votes: {:.0}", pool.gauge.weight);
            }
        }
    }

    async fn execute_multi_optimize_command(
        service: &OptimizerService,
        min_pools: Option<u32>,
        max_pools: Option<u32>,
        blacklist: Vec<String>,
    ) -> Result<(), ApiError> {
        {
            let mut store = service.store().write().await;
            if let Some(min_pools) = min_pools {
                store.set_min_pools(min_pools);
            }
            if let Some(max_pools) = max_pools {
                store.set_max_pools_advanced(max_pools);
            }
            for pool in &blacklist {
                if !store.state().is_blacklisted(pool) {
                    store.toggle_blacklist(pool);
                }
            }
        }

        let ranked = service.multi_optimize().await?;
        info!("📊 Results by pool count:");
        for entry in &ranked {
            info!(
                "   {:>2} pools: {} (fees {}, bribes {})",
                entry.max_pools,
                format_currency(entry.result.total_expected_return),
                format_currency(entry.result.total_expected_fee_return),
                format_currency(entry.result.total_expected_bribe_return)
            );
        }
        if let Some(best) = ranked.first() {
            log_result(&format!("Best allocation ({} pools)", best.max_pools), &best.result);
        }
        Ok(())
    }

    async fn execute_current_votes_command(
        service: &OptimizerService,
        api: &dyn OptimizerApi,
    ) -> Result<(), ApiError> {
        let report = service.load_current_votes().await?;
        if report.votes.is_empty() {
            info!("No votes cast yet");
            return Ok(());
        }

        // Names only; the listing being down is not fatal here
        let chain = service.store().read().await.state().selected_chain;
        let pools = match api.fetch_pools(chain).await {
            Ok(pools) => PoolManager::new(pools),
            Err(e) => {
                warn!("pool names unavailable: {}", e);
                PoolManager::default()
            }
        };

        info!("📊 Current votes:");
        for (address, pct) in report.votes.pool_addresses.iter().zip(&report.votes.percentages) {
            info!("   {} {}", pools.display_name(address), format_percentage(*pct));
        }
        match report.simulated_earnings {
            Some(result) => log_result("Estimated earnings", &result),
            None => warn!("Earnings estimate unavailable"),
        }
        Ok(())
    }

    async fn execute_vote_command(
        service: &OptimizerService,
        allocations: Vec<(String, f64)>,
        dry_run: bool,
    ) -> Result<(), ApiError> {
        if allocations.is_empty() {
            let result = service.optimize().await?;
            log_result("Optimal allocation", &result);
        } else {
            Self::apply_allocations(service, &allocations).await;
        }

        if dry_run {
            let store = service.store().read().await;
            let state = store.state();
            info!("Dry run, nothing submitted:");
            for (pool, pct) in state.selected_pools.iter().zip(state.selected_proportions()) {
                info!("   {} {}", pool, format_percentage(pct));
            }
            return Ok(());
        }

        let hash = service.vote().await?;
        info!("🚀 Vote transaction {}", shorten_tx_hash(&hash));
        Ok(())
    }

    /// Interactive loop: each stdin line edits the store and the trigger
    /// re-simulates after the quiet period
    async fn execute_watch_command(
        service: Arc<OptimizerService>,
        api: Arc<dyn OptimizerApi>,
        config: TriggerConfig,
    ) -> Result<(), ApiError> {
        let store = service.store().clone();
        let printer = store.write().await.subscribe(|state, change| {
            if change == StateChange::Results {
                if let Some(result) = &state.current_simulation {
                    log_result("Live simulation", result);
                }
            }
        });
        let trigger = SimulationTrigger::start(store.clone(), api, config).await;

        info!("Enter <pool>=<pct>, -<pool>, power <n>, chain <name>, show, reset or quit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin closed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let input = match WatchInput::parse(&line) {
                Ok(input) => input,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            let mut guard = store.write().await;
            match input {
                WatchInput::Allocate(address, pct) => {
                    if !guard.state().selected_pools.contains(&address) {
                        guard.toggle_pool_selection(&address);
                    }
                    guard.set_pool_allocation(&address, pct);
                }
                WatchInput::Deselect(address) => {
                    if guard.state().selected_pools.contains(&address) {
                        guard.toggle_pool_selection(&address);
                    }
                }
                WatchInput::VotingPower(power) => guard.set_voting_power(power),
                WatchInput::Chain(chain) => guard.set_chain(chain),
                WatchInput::Show => {
                    let state = guard.state();
                    info!(
                        "{} pools, total {}, simulating: {}",
                        state.selected_pools.len(),
                        format_percentage(state.total_allocation()),
                        trigger.is_simulating()
                    );
                }
                WatchInput::Reset => {
                    drop(guard);
                    service.reset().await;
                    continue;
                }
                WatchInput::Quit => break,
            }
        }

        // Let an in-flight simulation land before exiting
        while trigger.is_simulating() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        trigger.shutdown().await;
        store.write().await.unsubscribe(printer);
        Ok(())
    }
}

fn log_result(title: &str, result: &OptimizationResult) {
    info!("✅ {}:", title);
    for allocation in &result.allocations {
        info!(
            "   {} {} -> {}",
            allocation.pool_name,
            format_percentage(allocation.vote_percentage),
            format_currency(allocation.expected_return)
        );
    }
    info!(
        "   Total: {} (fees {}, bribes {}, fee share {})",
        format_currency(result.total_expected_return),
        format_currency(result.total_expected_fee_return),
        format_currency(result.total_expected_bribe_return),
        format_percentage(result.fee_share_percentage)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allocation() {
        assert_eq!(parse_allocation("0xabc=60").unwrap(), ("0xabc".to_string(), 60.0));
        assert_eq!(parse_allocation(" 0xabc = 12.5% ").unwrap(), ("0xabc".to_string(), 12.5));
        assert!(parse_allocation("0xabc").is_err());
        assert!(parse_allocation("=50").is_err());
        assert!(parse_allocation("0xabc=150").is_err());
        assert!(parse_allocation("0xabc=lots").is_err());
    }

    #[test]
    fn test_parse_watch_input() {
        assert_eq!(
            WatchInput::parse("0xabc=40").unwrap(),
            WatchInput::Allocate("0xabc".into(), 40.0)
        );
        assert_eq!(WatchInput::parse("-0xabc").unwrap(), WatchInput::Deselect("0xabc".into()));
        assert_eq!(WatchInput::parse("power 1000").unwrap(), WatchInput::VotingPower(1000.0));
        assert_eq!(WatchInput::parse("chain Linea").unwrap(), WatchInput::Chain(ChainType::Linea));
        assert_eq!(WatchInput::parse("quit").unwrap(), WatchInput::Quit);
        assert!(WatchInput::parse("chain solana").is_err());
        assert!(WatchInput::parse("power a b").is_err());
    }

    #[test]
    fn test_cli_parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vevote",
            "simulate",
            "--pool",
            "0xa=50",
            "--pool",
            "0xb=50",
            "--chain",
            "polygon",
        ])
        .unwrap();
        assert_eq!(cli.global.chain, Some(ChainType::Polygon));
        match cli.command {
            Commands::Simulate { allocations } => assert_eq!(allocations.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_multi_optimize_flags() {
        let cli = Cli::try_parse_from([
            "vevote",
            "multi-optimize",
            "--min-pools",
            "2",
            "--max-pools",
            "6",
            "--blacklist",
            "0xdead",
        ])
        .unwrap();
        match cli.command {
            Commands::MultiOptimize {
                min_pools,
                max_pools,
                blacklist,
            } => {
                assert_eq!(min_pools, Some(2));
                assert_eq!(max_pools, Some(6));
                assert_eq!(blacklist, vec!["0xdead".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_pool_counts_outside_range() {
        for args in [
            vec!["vevote", "optimize", "--max-pools", "0"],
            vec!["vevote", "optimize", "--max-pools", "5000"],
            vec!["vevote", "multi-optimize", "--min-pools", "0"],
            vec!["vevote", "multi-optimize", "--max-pools", "21"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_err(), "{:?} should be rejected", args);
        }

        let cli = Cli::try_parse_from(["vevote", "optimize", "--max-pools", "20"]).unwrap();
        match cli.command {
            Commands::Optimize { max_pools, .. } => assert_eq!(max_pools, Some(20)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_pools_filter_and_sort() {
        let cli = Cli::try_parse_from(["vevote", "pools"]).unwrap();
        match cli.command {
            Commands::Pools {
                min_rewards,
                sort,
                asc,
                ..
            } => {
                assert_eq!(min_rewards, DEFAULT_MIN_REWARDS);
                assert_eq!(sort, PoolSort::Rewards);
                assert!(!asc);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "vevote",
            "pools",
            "--min-rewards",
            "0",
            "--sort",
            "apr",
            "--asc",
        ])
        .unwrap();
        match cli.command {
            Commands::Pools {
                min_rewards,
                sort,
                asc,
                ..
            } => {
                assert_eq!(min_rewards, 0.0);
                assert_eq!(sort, PoolSort::Apr);
                assert!(asc);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["vevote", "pools", "--sort", "volume"]).is_err());
    }
}
