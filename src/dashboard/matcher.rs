use crate::models::SentimentPricePoint;
use chrono::{DateTime, Utc};

/// Point whose time is nearest to `target`. On a tie the earlier point wins,
/// so the result does not depend on the order of `points`.
pub fn closest_point(points: &[SentimentPricePoint], target: DateTime<Utc>) -> Option<&SentimentPricePoint> {
    let target_ms = target.timestamp_millis();
    points
        .iter()
        .min_by_key(|p| ((p.unix_time_millis - target_ms).unsigned_abs(), p.unix_time_millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn point(h: u32, m: u32) -> SentimentPricePoint {
        SentimentPricePoint::new(format!("{:02}:{:02}", h, m), at(h, m), 100.0, 50)
    }

    #[test]
    fn test_picks_nearest() {
        let points = vec![point(10, 0), point(10, 5), point(10, 10)];
        assert_eq!(closest_point(&points, at(10, 3)).unwrap().date, at(10, 5));
        assert_eq!(closest_point(&points, at(9, 0)).unwrap().date, at(10, 0));
        assert_eq!(closest_point(&points, at(23, 0)).unwrap().date, at(10, 10));
    }

    #[test]
    fn test_tie_prefers_earlier_in_any_order() {
        let points = vec![point(10, 10), point(10, 0)];
        assert_eq!(closest_point(&points, at(10, 5)).unwrap().date, at(10, 0));
    }

    #[test]
    fn test_empty_series() {
        assert!(closest_point(&[], at(10, 0)).is_none());
    }
}
