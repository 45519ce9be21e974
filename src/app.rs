// src/app.rs
use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::commands::{CommandExecutor, Commands, GlobalArgs};
use crate::application::notifications::TracingNotifier;
use crate::application::realtime_simulation::TriggerConfig;
use crate::application::services::OptimizerService;
use crate::config::Config;
use crate::domain::store::{OptimizerState, OptimizerStore};
use crate::infrastructure::api::{HttpOptimizerClient, OptimizerApi};
use crate::infrastructure::blockchain::{ContractAddresses, HydrexChainClient, VoteChain};
use crate::shared::types::ChainType;

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub api_base_url: String,
    pub pools_url: String,
    pub rpc_url: String,
    pub chain: ChainType,
    pub contracts: ContractAddresses,

    // Wallet
    pub private_key: Option<String>,
    pub wallet_address: Option<Address>,

    // Optimizer defaults
    pub voting_power: f64,
    pub max_pools: u32,
    pub min_pools: u32,
    pub max_pools_advanced: u32,
    pub blacklist: Vec<String>,
    pub trigger: TriggerConfig,
}

impl AppCfg {
    /// Build from the config file; the signer key comes from the env var it names
    pub fn from_config(cfg: Config) -> Result<Self> {
        let private_key = std::env::var(&cfg.wallet.private_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::build(cfg, private_key)
    }

    fn build(cfg: Config, private_key: Option<String>) -> Result<Self> {
        let chain: ChainType = cfg
            .chain
            .name
            .parse()
            .with_context(|| format!("chain.name = {}", cfg.chain.name))?;

        let defaults = ContractAddresses::default();
        let contracts = ContractAddresses {
            voting_escrow: parse_address(cfg.chain.voting_escrow.as_deref(), defaults.voting_escrow)
                .context("chain.voting_escrow")?,
            voter: parse_address(cfg.chain.voter.as_deref(), defaults.voter).context("chain.voter")?,
            multicall: parse_address(cfg.chain.multicall.as_deref(), defaults.multicall)
                .context("chain.multicall")?,
        };

        let wallet_address = cfg
            .wallet
            .address
            .as_deref()
            .map(|a| a.parse::<Address>())
            .transpose()
            .context("wallet.address")?;

        Ok(Self {
            api_base_url: cfg.api.base_url,
            pools_url: cfg.api.pools_url,
            rpc_url: cfg.chain.rpc_url,
            chain,
            contracts,
            private_key,
            wallet_address,
            voting_power: cfg.optimizer.voting_power,
            max_pools: cfg.optimizer.max_pools,
            min_pools: cfg.optimizer.min_pools,
            max_pools_advanced: cfg.optimizer.max_pools_advanced,
            blacklist: cfg.optimizer.blacklist,
            trigger: TriggerConfig {
                quiet_period_ms: cfg.optimizer.quiet_period_ms,
            },
        })
    }

    /// CLI args take priority over the config file
    pub fn with_cli_args(mut self, args: &GlobalArgs) -> Self {
        if let Some(api_url) = &args.api_url {
            self.api_base_url = api_url.clone();
        }
        if let Some(pools_url) = &args.pools_url {
            self.pools_url = pools_url.clone();
        }
        if let Some(rpc_url) = &args.rpc_url {
            self.rpc_url = rpc_url.clone();
        }
        if let Some(chain) = args.chain {
            self.chain = chain;
        }
        if let Some(voting_power) = args.voting_power {
            self.voting_power = voting_power;
        }
        self
    }

    /// Initial store contents for this configuration
    pub fn initial_state(&self) -> OptimizerState {
        OptimizerState {
            selected_chain: self.chain,
            voting_power: self.voting_power,
            max_pools: self.max_pools,
            min_pools: self.min_pools,
            max_pools_advanced: self.max_pools_advanced,
            blacklisted_pools: self.blacklist.iter().cloned().collect(),
            ..OptimizerState::default()
        }
    }
}

fn parse_address(value: Option<&str>, default: Address) -> Result<Address> {
    match value {
        Some(s) => s.trim().parse().with_context(|| format!("invalid address {}", s)),
        None => Ok(default),
    }
}

pub async fn run(cfg: AppCfg, command: Commands) -> Result<()> {
    info!(chain = %cfg.chain, api = %cfg.api_base_url, rpc = %cfg.rpc_url, "🚀 Starting vevote");

    let api: Arc<dyn OptimizerApi> = Arc::new(
        HttpOptimizerClient::with_endpoints(&cfg.api_base_url, &cfg.pools_url)
            .context("create optimizer client")?,
    );

    let chain_client = match &cfg.private_key {
        Some(key) => HydrexChainClient::with_signer(&cfg.rpc_url, cfg.contracts, key)
            .context("create signing chain client")?,
        None => HydrexChainClient::read_only(&cfg.rpc_url, cfg.contracts)
            .context("create chain client")?,
    };
    let account = chain_client.account().or(cfg.wallet_address);
    let chain: Arc<dyn VoteChain> = Arc::new(chain_client);

    let store = OptimizerStore::with_state(cfg.initial_state()).shared();
    let service = Arc::new(OptimizerService::new(
        store,
        api.clone(),
        Some(chain),
        Arc::new(TracingNotifier),
    ));

    match account {
        Some(address) => service.connect_wallet(address).await,
        None => warn!("⚠️ No wallet configured, voting is disabled"),
    }

    CommandExecutor::execute(command, service, api, cfg.trigger)
        .await
        .map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::contracts::VOTER_ADDRESS;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = AppCfg::build(Config::default(), None).unwrap();
        assert_eq!(cfg.chain, ChainType::Base);
        assert_eq!(cfg.contracts.voter, VOTER_ADDRESS);
        assert_eq!(cfg.trigger.quiet_period_ms, 500);
        assert!(cfg.private_key.is_none());
        assert!(cfg.wallet_address.is_none());
    }

    #[test]
    fn test_cli_args_override_config() {
        let file = Config::from_toml(
            r#"
            [chain]
            name = "linea"
            rpc_url = "http://localhost:8545"

            [optimizer]
            voting_power = 10.0
            "#,
        )
        .unwrap();
        let args = GlobalArgs {
            chain: Some(ChainType::Arbitrum),
            voting_power: Some(42.0),
            ..Default::default()
        };
        let cfg = AppCfg::build(file, None).unwrap().with_cli_args(&args);

        assert_eq!(cfg.chain, ChainType::Arbitrum);
        assert_eq!(cfg.voting_power, 42.0);
        assert_eq!(cfg.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_bad_chain_or_address_is_rejected() {
        let bad_chain = Config::from_toml("[chain]\nname = \"solana\"").unwrap();
        assert!(AppCfg::build(bad_chain, None).is_err());

        let bad_voter = Config::from_toml("[chain]\nvoter = \"0x1234\"").unwrap();
        assert!(AppCfg::build(bad_voter, None).is_err());
    }

    #[test]
    fn test_initial_state_carries_settings() {
        let file = Config::from_toml(
            "[optimizer]\nmax_pools = 3\nmin_pools = 2\nblacklist = [\"0xdead\"]",
        )
        .unwrap();
        let state = AppCfg::build(file, None).unwrap().initial_state();
        assert_eq!(state.max_pools, 3);
        assert_eq!(state.min_pools, 2);
        assert!(state.is_blacklisted("0xdead"));
        assert_eq!(state.voting_power, 1_600_000.0);
    }
}
