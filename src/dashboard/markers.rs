use crate::dashboard::matcher::closest_point;
use crate::models::{SentimentPricePoint, Trade, TradeDirection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Open,
    Close,
}

/// A trade's open or close instant, pinned to the nearest point of the
/// series so it lands on the chart's x-axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeMarker {
    /// Trade id for open markers, `<id>_close` for close markers.
    pub id: String,
    pub trade_id: String,
    pub kind: MarkerKind,
    pub price: f64,
    pub direction: TradeDirection,
    pub sol_amount: f64,
    pub usdc_value: f64,
    pub realized_pnl: Option<f64>,
    pub occurred_at: DateTime<Utc>,
    pub point_timestamp: String,
    pub point_value: u8,
    pub unix_time_millis: i64,
}

impl TradeMarker {
    pub fn is_open(&self) -> bool {
        self.kind == MarkerKind::Open
    }

    fn at_point(trade: &Trade, kind: MarkerKind, price: f64, occurred_at: DateTime<Utc>, point: &SentimentPricePoint) -> Self {
        let (id, realized_pnl) = match kind {
            MarkerKind::Open => (trade.id.clone(), None),
            MarkerKind::Close => (format!("{}_close", trade.id), trade.realized_pnl),
        };
        Self {
            id,
            trade_id: trade.id.clone(),
            kind,
            price,
            direction: trade.direction,
            sol_amount: trade.sol_amount,
            usdc_value: trade.usdc_value,
            realized_pnl,
            occurred_at,
            point_timestamp: point.timestamp.clone(),
            point_value: point.value,
            unix_time_millis: point.unix_time_millis,
        }
    }
}

/// Builds open/close markers for `trades` against `points`.
///
/// Every trade with an open time gets an open marker at its entry price.
/// Closed trades with both a close time and a close price also get a close
/// marker carrying the realized P&L. Nothing is emitted when `points` is empty.
pub fn build_trade_markers(trades: &[Trade], points: &[SentimentPricePoint]) -> Vec<TradeMarker> {
    let mut markers = Vec::with_capacity(trades.len() * 2);

    for trade in trades {
        let Some(opened_at) = trade.opened_at else {
            continue;
        };

        if let Some(point) = closest_point(points, opened_at) {
            markers.push(TradeMarker::at_point(trade, MarkerKind::Open, trade.entry_price, opened_at, point));
        }

        if !trade.is_closed() {
            continue;
        }
        if let (Some(closed_at), Some(close_price)) = (trade.closed_at, trade.close_price) {
            if let Some(point) = closest_point(points, closed_at) {
                markers.push(TradeMarker::at_point(trade, MarkerKind::Close, close_price, closed_at, point));
            }
        }
    }

    markers
}
