//! Common types used across the application

use alloy::primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ApiError;

/// Supported chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    #[default]
    Base,
    Linea,
    Polygon,
    Unichain,
    Ethereum,
    Arbitrum,
}

impl ChainType {
    pub const ALL: [ChainType; 6] = [
        ChainType::Base,
        ChainType::Linea,
        ChainType::Polygon,
        ChainType::Unichain,
        ChainType::Ethereum,
        ChainType::Arbitrum,
    ];

    /// EVM chain id used to filter the pool listing
    pub fn chain_id(&self) -> u64 {
        match self {
            ChainType::Base => 8453,
            ChainType::Linea => 59144,
            ChainType::Polygon => 137,
            ChainType::Unichain => 1301,
            ChainType::Ethereum => 1,
            ChainType::Arbitrum => 42161,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainType::Base => "base",
            ChainType::Linea => "linea",
            ChainType::Polygon => "polygon",
            ChainType::Unichain => "unichain",
            ChainType::Ethereum => "ethereum",
            ChainType::Arbitrum => "arbitrum",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ChainType::ALL
            .into_iter()
            .find(|chain| chain.as_str() == needle)
            .ok_or_else(|| ApiError::new(format!("Unsupported chain: {}", s)))
    }
}

/// `null` decodes to the field's default, the way the listing's JS consumers read it
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// JSON numbers carry no integer/float split; `8453.0` is a valid chain id
fn lenient_uint<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(T::default());
    };
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(de::Error::custom(format!("expected an unsigned integer, got {}", value)));
    }
    T::try_from(value as u64).map_err(|_| de::Error::custom(format!("integer out of range: {}", value)))
}

/// Fee token entry inside a gauge's bribe breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeToken {
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub decimals: u8,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub projected_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaugeBribes {
    pub bribe: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub fee: Vec<FeeToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignBreakdown {
    #[serde(deserialize_with = "null_as_default")]
    pub weight_fees: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub weight_token0: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub weight_token1: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_range_tvl: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub daily_rewards: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub reward_tokens: Vec<serde_json::Value>,
}

/// Per-pool reward accounting as reported by the pool listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gauge {
    /// Current total votes on this pool
    #[serde(deserialize_with = "null_as_default")]
    pub weight: f64,
    /// Annual fee rewards available (USD)
    #[serde(deserialize_with = "null_as_default")]
    pub fee_in_usd: f64,
    /// Annual bribe rewards available (USD)
    #[serde(deserialize_with = "null_as_default")]
    pub bribes_in_usd: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub apr: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub tvl: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub day_farming_apr: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub full_farming_apr: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub farming_apr_max: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub farming_apr_min: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub voting_apr_projection: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub live_voting_weight: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_alive: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub reward_per_second: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub reward_for_duration: f64,
    /// Unix seconds
    #[serde(deserialize_with = "null_as_default")]
    pub period_finish: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_period_finished: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub time_until_period_finish: f64,
    pub campaign_breakdown: Option<CampaignBreakdown>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_calculating: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub bribes: GaugeBribes,
}

/// Pool snapshot from the pool listing endpoint.
///
/// Missing or `null` fields decode to defaults so one sparse entry never
/// fails the whole listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pool {
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub chain_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub gauge: Gauge,
    #[serde(deserialize_with = "null_as_default")]
    pub liquidity_type: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub risk_level: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub strategist: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub token0_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token1_address: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub pool_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_tags: Vec<serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub order: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub risk_description: String,
}

/// One pool's share of an optimized or simulated vote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoteAllocation {
    #[serde(deserialize_with = "null_as_default")]
    pub pool_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pool_name: String,
    /// Voting power allocated to this pool (ETH)
    #[serde(deserialize_with = "null_as_default")]
    pub voting_power: f64,
    /// Percentage in 0..=100
    #[serde(deserialize_with = "null_as_default")]
    pub vote_percentage: f64,
    pub pool: Option<Pool>,
    #[serde(deserialize_with = "null_as_default")]
    pub expected_return: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub expected_fee_return: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub expected_bribe_return: f64,
}

/// Result of the optimizer or simulate endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationResult {
    #[serde(deserialize_with = "null_as_default")]
    pub allocations: Vec<VoteAllocation>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_expected_return: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_expected_fee_return: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_expected_bribe_return: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub fee_share_percentage: f64,
}

/// Body of the simulate-vote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub pools: Vec<String>,
    /// Basis points, must sum to 10000
    pub weights: Vec<u32>,
    pub voting_power: f64,
}

/// One row of the advanced (multi pool count) comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiOptimizationEntry {
    pub max_pools: u32,
    pub result: OptimizationResult,
}

/// On-chain voting power snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct VotingPowerInfo {
    pub address: String,
    pub voting_power: U256,
    pub timestamp: u64,
    pub formatted_power: String,
    pub power: f64,
}

/// Votes a user has already cast on the voter contract
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentVotes {
    pub pool_addresses: Vec<String>,
    pub weights: Vec<U256>,
    pub percentages: Vec<f64>,
    pub total_weight: U256,
}

impl CurrentVotes {
    pub fn is_empty(&self) -> bool {
        self.pool_addresses.is_empty()
    }
}
