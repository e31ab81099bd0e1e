use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One price/sentiment sample. `timestamp` keeps the raw source text, `date`
/// and `unix_time_millis` the parsed instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPricePoint {
    pub timestamp: String,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub value: u8,
    pub unix_time_millis: i64,
}

impl SentimentPricePoint {
    pub fn new(timestamp: impl Into<String>, date: DateTime<Utc>, price: f64, value: u8) -> Self {
        Self {
            timestamp: timestamp.into(),
            date,
            price,
            value,
            unix_time_millis: date.timestamp_millis(),
        }
    }
}

/// Sorts a series ascending by `unix_time_millis`. Stable, so equal instants
/// keep their source order.
pub fn sort_chronologically(points: &mut [SentimentPricePoint]) {
    points.sort_by_key(|p| p.unix_time_millis);
}

/// Latest point of a series regardless of its order.
pub fn latest_point(points: &[SentimentPricePoint]) -> Option<&SentimentPricePoint> {
    points.iter().max_by_key(|p| p.unix_time_millis)
}
