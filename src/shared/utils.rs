//! Utility functions and helpers

use alloy::primitives::U256;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

/// Basis points representing 100%
pub const FULL_WEIGHT_BPS: u32 = 10_000;

/// Tolerance used wherever an allocation total is compared against 100%
pub const ALLOCATION_TOLERANCE: f64 = 0.1;

/// Convert percentage to basis points (rounded)
pub fn percentage_to_basis_points(percentage: f64) -> u32 {
    (percentage * 100.0).round().max(0.0) as u32
}

/// Convert basis points to percentage
pub fn basis_points_to_percentage(basis_points: u32) -> f64 {
    basis_points as f64 / 100.0
}

/// Strict check used by forms before accepting an allocation map
pub fn validate_allocations<'a>(percentages: impl IntoIterator<Item = &'a f64>) -> bool {
    let total: f64 = percentages.into_iter().sum();
    (total - 100.0).abs() < 0.01
}

/// Whether a total is close enough to 100% to simulate or vote
pub fn is_allocation_complete(total: f64) -> bool {
    (total - 100.0).abs() < ALLOCATION_TOLERANCE
}

/// Convert an 18-decimal fixed point integer to a float
pub fn wei_to_ether(value: U256) -> f64 {
    f64::from(value) / 1e18
}

/// Unix timestamp of the most recent Thursday 00:00 UTC at or before `now`.
///
/// Voting-escrow epochs roll over on Thursdays, so past votes are read at
/// that boundary.
pub fn last_thursday_timestamp(now: DateTime<Utc>) -> i64 {
    let day_of_week = now.weekday().num_days_from_sunday() as i64; // 0 = Sunday, 4 = Thursday
    let days_since_thursday = if day_of_week >= 4 {
        day_of_week - 4
    } else {
        day_of_week + 3
    };
    let thursday = now.date_naive() - Duration::days(days_since_thursday);
    thursday.and_time(NaiveTime::default()).and_utc().timestamp()
}

/// Format USD values. Whole dollars from 1000 up, cents below.
pub fn format_currency(value: f64) -> String {
    let decimals = if value.abs() >= 1000.0 { 0 } else { 2 };
    let rendered = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match rendered.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    out.push('$');
    out.push_str(&group_thousands(&whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(&fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Format percentage for display
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format large numbers with K/M/B suffixes
pub fn format_large_number(value: f64) -> String {
    if value >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${:.2}", value)
    }
}

/// `0x1234abcd...deadbeef` style hash for notifications
pub fn shorten_tx_hash(hash: &str) -> String {
    if hash.len() <= 18 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..10], &hash[hash.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    #[test]
    fn test_basis_points_conversion() {
        assert_eq!(percentage_to_basis_points(25.0), 2500);
        assert_eq!(percentage_to_basis_points(33.336), 3334);
        assert_eq!(basis_points_to_percentage(2550), 25.5);
    }

    #[test]
    fn test_allocation_checks() {
        assert!(validate_allocations(&[60.0, 40.0]));
        assert!(!validate_allocations(&[60.0, 39.95]));
        assert!(is_allocation_complete(99.95));
        assert!(!is_allocation_complete(99.8));
    }

    #[test]
    fn test_wei_to_ether() {
        let raw = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(wei_to_ether(raw), 1.5);
    }

    #[test]
    fn test_last_thursday_from_saturday() {
        // 2026-10-17 is a Saturday
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 15, 30, 0).unwrap();
        let ts = last_thursday_timestamp(now);
        let thursday = Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap();
        assert_eq!(ts, thursday.timestamp());
    }

    #[test]
    fn test_last_thursday_on_thursday_and_wednesday() {
        let thursday_noon = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap();
        assert_eq!(last_thursday_timestamp(thursday_noon), midnight.timestamp());

        let wednesday = Utc.with_ymd_and_hms(2026, 10, 21, 23, 59, 59).unwrap();
        assert_eq!(last_thursday_timestamp(wednesday), midnight.timestamp());
    }

    #[test]
    fn test_last_thursday_is_within_a_week() {
        for day in 1..=28 {
            let now = Utc.with_ymd_and_hms(2026, 2, day, 6, 0, 0).unwrap();
            let ts = last_thursday_timestamp(now);
            let snapshot = Utc.timestamp_opt(ts, 0).unwrap();
            assert_eq!(snapshot.weekday(), Weekday::Thu);
            assert!(snapshot <= now);
            assert!(now - snapshot < Duration::days(7));
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.89), "$1,234,568");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(2_500_000_000.0), "$2.5B");
        assert_eq!(format_large_number(1_260_000.0), "$1.3M");
        assert_eq!(format_large_number(1_500.0), "$1.5K");
        assert_eq!(format_large_number(12.0), "$12.00");
        assert_eq!(format_percentage(12.345), "12.3%");
    }

    #[test]
    fn test_shorten_tx_hash() {
        let hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        assert_eq!(shorten_tx_hash(hash), "0x12345678...90abcdef");
    }
}
