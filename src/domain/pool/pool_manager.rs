//! Pool manager for the fetched pool listing

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::shared::types::{ChainType, Pool};

/// Annual rewards (USD) a pool needs to show up in the listing by default
pub const DEFAULT_MIN_REWARDS: f64 = 300.0;

/// Listing sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolSort {
    /// Fees + bribes
    #[default]
    Rewards,
    /// Projected voting APR
    Apr,
    Tvl,
    Title,
}

impl PoolSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolSort::Rewards => "rewards",
            PoolSort::Apr => "apr",
            PoolSort::Tvl => "tvl",
            PoolSort::Title => "title",
        }
    }

    fn compare(&self, a: &Pool, b: &Pool) -> Ordering {
        let by_number = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        match self {
            PoolSort::Rewards => by_number(total_rewards(a), total_rewards(b)),
            PoolSort::Apr => by_number(a.gauge.voting_apr_projection, b.gauge.voting_apr_projection),
            PoolSort::Tvl => by_number(a.gauge.tvl, b.gauge.tvl),
            PoolSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }
}

impl fmt::Display for PoolSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rewards" => Ok(PoolSort::Rewards),
            "apr" => Ok(PoolSort::Apr),
            "tvl" => Ok(PoolSort::Tvl),
            "title" => Ok(PoolSort::Title),
            other => Err(format!("unknown sort '{}', expected rewards, apr, tvl or title", other)),
        }
    }
}

/// Fees + bribes in USD
pub fn total_rewards(pool: &Pool) -> f64 {
    pool.gauge.fee_in_usd + pool.gauge.bribes_in_usd
}

/// Keeps the pools of one chain and answers lookups by address
#[derive(Debug, Clone, Default)]
pub struct PoolManager {
    pools: Vec<Pool>,
}

impl PoolManager {
    pub fn new(pools: Vec<Pool>) -> Self {
        Self { pools }
    }

    /// Client-side chain filter; the listing endpoint is not chain aware
    pub fn filter_for_chain(pools: Vec<Pool>, chain: ChainType) -> Vec<Pool> {
        let chain_id = chain.chain_id();
        pools
            .into_iter()
            .filter(|pool| pool.chain_id == chain_id)
            .collect()
    }

    pub fn get_pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Addresses compare case-insensitively, as checksummed and lowercase forms mix
    pub fn find(&self, address: &str) -> Option<&Pool> {
        self.pools
            .iter()
            .find(|pool| pool.address.eq_ignore_ascii_case(address))
    }

    pub fn display_name(&self, address: &str) -> String {
        self.find(address)
            .map(|pool| pool.title.clone())
            .unwrap_or_else(|| address.to_string())
    }

    /// Pools with at least `min_rewards` in annual rewards, ordered by `sort`.
    ///
    /// Descending unless `ascending`; ties keep listing order.
    pub fn listing(&self, min_rewards: f64, sort: PoolSort, ascending: bool) -> Vec<&Pool> {
        let mut pools: Vec<&Pool> = self
            .pools
            .iter()
            .filter(|pool| total_rewards(pool) >= min_rewards)
            .collect();
        pools.sort_by(|a, b| {
            let ordering = sort.compare(a, b);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        pools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(address: &str, chain_id: u64, fees: f64, bribes: f64) -> Pool {
        let mut pool = Pool {
            address: address.to_string(),
            title: format!("{} pool", address),
            chain_id,
            ..Default::default()
        };
        pool.gauge.fee_in_usd = fees;
        pool.gauge.bribes_in_usd = bribes;
        pool
    }

    #[test]
    fn test_filter_for_chain() {
        let pools = vec![pool("0xA", 8453, 0.0, 0.0), pool("0xB", 137, 0.0, 0.0)];
        let base = PoolManager::filter_for_chain(pools, ChainType::Base);
        assert_eq!(base.len(), 1);
        assert_eq!(base[0].address, "0xA");
    }

    #[test]
    fn test_lookup_by_address() {
        let manager = PoolManager::new(vec![pool("0xAbC", 8453, 10.0, 5.0)]);
        assert_eq!(manager.display_name("0xabc"), "0xAbC pool");
        assert_eq!(manager.display_name("0x999"), "0x999");
    }

    fn addresses(pools: Vec<&Pool>) -> Vec<&str> {
        pools.iter().map(|p| p.address.as_str()).collect()
    }

    #[test]
    fn test_listing_filters_by_min_rewards() {
        let manager = PoolManager::new(vec![
            pool("0xa", 8453, 200.0, 99.0),
            pool("0xb", 8453, 200.0, 100.0),
            pool("0xc", 8453, 1000.0, 0.0),
        ]);

        let listed = manager.listing(DEFAULT_MIN_REWARDS, PoolSort::Rewards, false);
        assert_eq!(addresses(listed), vec!["0xc", "0xb"]);

        let everything = manager.listing(0.0, PoolSort::Rewards, true);
        assert_eq!(addresses(everything), vec!["0xa", "0xb", "0xc"]);
    }

    #[test]
    fn test_listing_sorts_by_each_field() {
        let mut a = pool("0xa", 8453, 500.0, 0.0);
        a.title = "weth/usdc".to_string();
        a.gauge.voting_apr_projection = 40.0;
        a.gauge.tvl = 10.0;
        let mut b = pool("0xb", 8453, 400.0, 0.0);
        b.title = "AERO/WETH".to_string();
        b.gauge.voting_apr_projection = 90.0;
        b.gauge.tvl = 5.0;
        let mut c = pool("0xc", 8453, 300.0, 300.0);
        c.title = "cbBTC/WETH".to_string();
        c.gauge.voting_apr_projection = 10.0;
        c.gauge.tvl = 50.0;
        let manager = PoolManager::new(vec![a, b, c]);

        assert_eq!(addresses(manager.listing(0.0, PoolSort::Rewards, false)), vec!["0xc", "0xa", "0xb"]);
        assert_eq!(addresses(manager.listing(0.0, PoolSort::Apr, false)), vec!["0xb", "0xa", "0xc"]);
        assert_eq!(addresses(manager.listing(0.0, PoolSort::Tvl, false)), vec!["0xc", "0xa", "0xb"]);
        assert_eq!(addresses(manager.listing(0.0, PoolSort::Title, true)), vec!["0xb", "0xc", "0xa"]);
        assert_eq!(addresses(manager.listing(0.0, PoolSort::Title, false)), vec!["0xa", "0xc", "0xb"]);
    }

    #[test]
    fn test_pool_sort_parses_case_insensitively() {
        assert_eq!("APR".parse::<PoolSort>().unwrap(), PoolSort::Apr);
        assert_eq!(PoolSort::default(), PoolSort::Rewards);
        assert!("volume".parse::<PoolSort>().is_err());
    }
}
