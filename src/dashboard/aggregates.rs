use crate::models::{SentimentPricePoint, Trade};
use crate::models::market::latest_point;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PRICE_PADDING: f64 = 0.005;

/// Fear & greed bucket for a sentiment reading. Each bucket includes its
/// upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl Sentiment {
    pub fn classify(value: u8) -> Self {
        match value {
            0..=25 => Sentiment::ExtremeFear,
            26..=40 => Sentiment::Fear,
            41..=60 => Sentiment::Neutral,
            61..=75 => Sentiment::Greed,
            _ => Sentiment::ExtremeGreed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::ExtremeFear => "Extreme Fear",
            Sentiment::Fear => "Fear",
            Sentiment::Neutral => "Neutral",
            Sentiment::Greed => "Greed",
            Sentiment::ExtremeGreed => "Extreme Greed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary tiles of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub current_value: u8,
    pub current_price: f64,
    pub sentiment: Sentiment,
    pub price_min: f64,
    pub price_max: f64,
    pub total_realized_pnl: f64,
    pub closed_trade_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// `(min * (1 - padding), max * (1 + padding))` over the visible prices, or
/// `(0, 0)` when nothing is visible.
pub fn price_bounds(visible: &[SentimentPricePoint], padding: f64) -> (f64, f64) {
    if visible.is_empty() {
        return (0.0, 0.0);
    }
    let min = visible.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max = visible.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    (min * (1.0 - padding), max * (1.0 + padding))
}

/// Realized P&L summed over closed trades; a missing P&L counts as zero.
pub fn total_realized_pnl(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_closed())
        .filter_map(|t| t.realized_pnl)
        .fold(0.0, |total, pnl| total + pnl)
}

pub fn closed_trade_count(trades: &[Trade]) -> usize {
    trades.iter().filter(|t| t.is_closed()).count()
}

/// Current readings come from the latest point of the full series and the
/// P&L from the full trade list, so neither depends on the selected range.
/// Only the price bounds use `visible_points`.
pub fn compute_summary(
    all_points: &[SentimentPricePoint],
    visible_points: &[SentimentPricePoint],
    all_trades: &[Trade],
    price_padding: f64,
) -> DashboardSummary {
    let latest = latest_point(all_points);
    let current_value = latest.map_or(0, |p| p.value);
    let current_price = latest.map_or(0.0, |p| p.price);
    let (price_min, price_max) = price_bounds(visible_points, price_padding);

    DashboardSummary {
        current_value,
        current_price,
        sentiment: Sentiment::classify(current_value),
        price_min,
        price_max,
        total_realized_pnl: total_realized_pnl(all_trades),
        closed_trade_count: closed_trade_count(all_trades),
        last_updated: latest.map(|p| p.date),
    }
}

impl DashboardSummary {
    pub fn render(&self) -> String {
        let last_updated = self
            .last_updated
            .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "No data available".to_string());
        format!(
            "Sentiment: {} ({})\n\
             SOL Price: ${:.2}\n\
             Price Axis: ${:.2} - ${:.2}\n\
             Realized PnL: ${:.4} from {} trades\n\
             Data last updated: {}",
            self.current_value,
            self.sentiment,
            self.current_price,
            self.price_min,
            self.price_max,
            self.total_realized_pnl,
            self.closed_trade_count,
            last_updated
        )
    }
}
