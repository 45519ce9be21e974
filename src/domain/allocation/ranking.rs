//! Ranking of multi-optimization results

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::shared::types::MultiOptimizationEntry;

/// Pool counts swept by the advanced optimization
pub fn pool_count_range(min_pools: u32, max_pools_advanced: u32) -> RangeInclusive<u32> {
    min_pools..=max_pools_advanced
}

/// Highest expected return first. Stable, so equal returns keep request order.
pub fn rank_by_expected_return(entries: &[MultiOptimizationEntry]) -> Vec<MultiOptimizationEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| {
        b.result
            .total_expected_return
            .partial_cmp(&a.result.total_expected_return)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

pub fn best_entry(entries: &[MultiOptimizationEntry]) -> Option<MultiOptimizationEntry> {
    rank_by_expected_return(entries).into_iter().next()
}
