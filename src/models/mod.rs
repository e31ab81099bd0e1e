use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

pub mod market;

pub use market::SentimentPricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "open"),
            TradeStatus::Closed => write!(f, "closed"),
        }
    }
}

/// One ledger entry. `opened_at` is `None` when the source timestamp could
/// not be parsed; such trades never reach the chart.
///
/// The close-side fields (`closed_at`, `close_price`, `realized_pnl`) are only
/// ever set on closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub direction: TradeDirection,
    pub status: TradeStatus,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub entry_price: f64,
    pub close_price: Option<f64>,
    pub sol_amount: f64,
    pub usdc_value: f64,
    pub realized_pnl: Option<f64>,
    pub unrealized_pnl: Option<f64>,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }
}
