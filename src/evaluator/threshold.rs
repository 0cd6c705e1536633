//! Threshold ladder arithmetic

use chrono::{DateTime, Utc};

/// Whole days between `now` and `not_after`, rounded toward zero
///
/// Fractional hours are dropped first, then the hours are divided by 24, so
/// 6 days 23 hours counts as 6 and an expiry 12 hours ago counts as 0.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (not_after - now).num_hours() / 24
}

/// Sort ascending and drop duplicates
pub fn normalize_thresholds(thresholds: &[u32]) -> Vec<u32> {
    let mut sorted = thresholds.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Pick the smallest threshold that `days_remaining` has reached
///
/// Only the nearest rung fires: with thresholds 7, 14 and 30 a certificate
/// five days from expiry selects 7.
pub fn select_threshold(days_remaining: i64, thresholds: &[u32]) -> Option<u32> {
    thresholds
        .iter()
        .copied()
        .filter(|&threshold| days_remaining <= i64::from(threshold))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_select_nearest_rung() {
        let thresholds = [7, 14, 30];
        assert_eq!(select_threshold(5, &thresholds), Some(7));
        assert_eq!(select_threshold(10, &thresholds), Some(14));
        assert_eq!(select_threshold(40, &thresholds), None);
    }

    #[test]
    fn test_select_boundaries() {
        let thresholds = [7, 14, 30];
        assert_eq!(select_threshold(7, &thresholds), Some(7));
        assert_eq!(select_threshold(8, &thresholds), Some(14));
        assert_eq!(select_threshold(30, &thresholds), Some(30));
        assert_eq!(select_threshold(31, &thresholds), None);
        assert_eq!(select_threshold(-2, &thresholds), Some(7));
        assert_eq!(select_threshold(0, &[]), None);
    }

    #[test]
    fn test_select_tolerates_unsorted_duplicates() {
        assert_eq!(select_threshold(5, &[30, 7, 14, 7]), Some(7));
        assert_eq!(normalize_thresholds(&[30, 7, 14, 7]), vec![7, 14, 30]);
    }

    #[test]
    fn test_days_remaining_rounds_toward_zero() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        assert_eq!(days_remaining(now + Duration::days(7), now), 7);
        assert_eq!(days_remaining(now + Duration::days(7) - Duration::minutes(1), now), 6);
        assert_eq!(days_remaining(now + Duration::hours(167), now), 6);
        assert_eq!(days_remaining(now + Duration::hours(23), now), 0);
        assert_eq!(days_remaining(now - Duration::hours(12), now), 0);
        assert_eq!(days_remaining(now - Duration::hours(36), now), -1);
    }
}
