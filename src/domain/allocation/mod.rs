//! Allocation domain - weight conversions and result ranking

pub mod ranking;
pub mod weights;

pub use ranking::{best_entry, pool_count_range, rank_by_expected_return};
pub use weights::{
    proportions_to_vote_weights, rebalance_to_full_weight, summarize_votes, validate_weight_total,
};
