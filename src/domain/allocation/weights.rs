//! Conversions between percentages, basis points and on-chain weights

use alloy::primitives::U256;

use crate::shared::errors::ApiError;
use crate::shared::types::CurrentVotes;
use crate::shared::utils::{percentage_to_basis_points, FULL_WEIGHT_BPS};

/// Simulation weights must add up to exactly 10000
pub fn validate_weight_total(weights: &[u32]) -> Result<(), ApiError> {
    let total: u64 = weights.iter().map(|w| *w as u64).sum();
    if total != FULL_WEIGHT_BPS as u64 {
        return Err(ApiError::new(format!(
            "Weights must sum to {} basis points (100%), got {}",
            FULL_WEIGHT_BPS, total
        )));
    }
    Ok(())
}

/// Vote weights for the voter contract: percentage * 100, floored
pub fn proportions_to_vote_weights(proportions: &[f64]) -> Vec<U256> {
    proportions
        .iter()
        .map(|p| U256::from((p * 100.0).floor().max(0.0) as u64))
        .collect()
}

/// Rounded basis points that sum to exactly 10000.
///
/// The rounding remainder is pushed onto the largest weight. Returns `None`
/// when the rounded total is zero or already above 10000.
pub fn rebalance_to_full_weight(percentages: &[f64]) -> Option<Vec<u32>> {
    let mut weights: Vec<u32> = percentages
        .iter()
        .copied()
        .map(percentage_to_basis_points)
        .collect();
    let total: u32 = weights.iter().sum();
    if total == 0 || total > FULL_WEIGHT_BPS {
        return None;
    }

    let diff = FULL_WEIGHT_BPS - total;
    if diff != 0 {
        // first index wins ties
        let largest = weights
            .iter()
            .enumerate()
            .fold(0, |best, (i, w)| if *w > weights[best] { i } else { best });
        weights[largest] += diff;
    }
    Some(weights)
}

/// Build the current-vote summary from raw contract weights
pub fn summarize_votes(pool_addresses: Vec<String>, weights: Vec<U256>) -> CurrentVotes {
    let total_weight = weights.iter().fold(U256::ZERO, |acc, w| acc + *w);
    let percentages = weights
        .iter()
        .map(|w| {
            if total_weight.is_zero() {
                0.0
            } else {
                f64::from(*w) / f64::from(total_weight) * 100.0
            }
        })
        .collect();

    CurrentVotes {
        pool_addresses,
        weights,
        percentages,
        total_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_total_validation() {
        assert!(validate_weight_total(&[2500, 2500, 2500, 2500]).is_ok());

        let err = validate_weight_total(&[2500, 2500, 2500, 2400]).unwrap_err();
        assert_eq!(
            err.message,
            "Weights must sum to 10000 basis points (100%), got 9900"
        );
        assert!(err.status.is_none());
    }

    #[test]
    fn test_vote_weights_are_floored() {
        let weights = proportions_to_vote_weights(&[33.339, 66.661]);
        assert_eq!(weights, vec![U256::from(3333u64), U256::from(6666u64)]);
    }

    #[test]
    fn test_rebalance_pushes_remainder_to_largest() {
        let weights = rebalance_to_full_weight(&[33.33, 33.33, 33.33]).unwrap();
        assert_eq!(weights, vec![3334, 3333, 3333]);
        assert_eq!(weights.iter().sum::<u32>(), 10_000);

        let weights = rebalance_to_full_weight(&[10.0, 59.99, 30.0]).unwrap();
        assert_eq!(weights, vec![1000, 6000, 3000]);
    }

    #[test]
    fn test_rebalance_rejects_empty_and_overflow() {
        assert!(rebalance_to_full_weight(&[]).is_none());
        assert!(rebalance_to_full_weight(&[0.0, 0.0]).is_none());
        assert!(rebalance_to_full_weight(&[60.0, 40.01]).is_none());
    }

    #[test]
    fn test_summarize_votes() {
        let votes = summarize_votes(
            vec!["0xA".into(), "0xB".into()],
            vec![U256::from(300u64), U256::from(100u64)],
        );
        assert_eq!(votes.total_weight, U256::from(400u64));
        assert_eq!(votes.percentages, vec![75.0, 25.0]);

        let zero = summarize_votes(vec!["0xA".into()], vec![U256::ZERO]);
        assert_eq!(zero.percentages, vec![0.0]);
    }
}
