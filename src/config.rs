use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::domain::store::optimizer_state::{
    DEFAULT_MAX_POOLS, DEFAULT_MAX_POOLS_ADVANCED, DEFAULT_MIN_POOLS, DEFAULT_VOTING_POWER,
};
use crate::infrastructure::api::{DEFAULT_API_BASE_URL, DEFAULT_POOLS_URL};
use crate::infrastructure::blockchain::DEFAULT_RPC_URL;

pub const DEFAULT_PRIVATE_KEY_ENV: &str = "VEVOTE_PRIVATE_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiCfg {
    pub base_url: String,
    pub pools_url: String,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            pools_url: DEFAULT_POOLS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainCfg {
    pub name: String, // "base", "linea", ...
    pub rpc_url: String,
    pub voting_escrow: Option<String>,
    pub voter: Option<String>,
    pub multicall: Option<String>,
}

impl Default for ChainCfg {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            voting_escrow: None,
            voter: None,
            multicall: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletCfg {
    /// Name of the env var holding the signer key
    pub private_key_env: String,
    /// Read-only address used when no key is available
    pub address: Option<String>,
}

impl Default for WalletCfg {
    fn default() -> Self {
        Self {
            private_key_env: DEFAULT_PRIVATE_KEY_ENV.to_string(),
            address: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerCfg {
    pub voting_power: f64,
    pub max_pools: u32,
    pub min_pools: u32,
    pub max_pools_advanced: u32,
    pub quiet_period_ms: u64,
    pub blacklist: Vec<String>,
}

impl Default for OptimizerCfg {
    fn default() -> Self {
        Self {
            voting_power: DEFAULT_VOTING_POWER,
            max_pools: DEFAULT_MAX_POOLS,
            min_pools: DEFAULT_MIN_POOLS,
            max_pools_advanced: DEFAULT_MAX_POOLS_ADVANCED,
            quiet_period_ms: 500,
            blacklist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiCfg,
    pub chain: ChainCfg,
    pub wallet: WalletCfg,
    pub optimizer: OptimizerCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }
}
