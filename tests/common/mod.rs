#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sentiment_dashboard::models::{SentimentPricePoint, Trade, TradeDirection, TradeStatus};
use std::fs;
use std::path::{Path, PathBuf};

pub const YEAR: i32 = 2025;

// Latest point of every fixture series.
pub fn latest() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(YEAR, 3, 10, 12, 0, 0).unwrap()
}

/// Formats an instant the way the sentiment log writes it, without a year.
pub fn log_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{}, {}/{}, {}",
        at.format("%a"),
        at.format("%d"),
        at.format("%b").to_string().to_uppercase(),
        at.format("%H:%M:%S")
    )
}

/// `count` points `step_minutes` apart ending at `latest()`, prices rising by 1.
pub fn points(count: i64, step_minutes: i64) -> Vec<SentimentPricePoint> {
    (0..count)
        .map(|i| {
            let at = latest() - Duration::minutes((count - 1 - i) * step_minutes);
            SentimentPricePoint::new(log_timestamp(at), at, 100.0 + i as f64, (i % 101) as u8)
        })
        .collect()
}

pub fn create_test_trade(id: &str, opened: DateTime<Utc>, closed: Option<(DateTime<Utc>, f64)>) -> Trade {
    Trade {
        id: id.to_string(),
        direction: TradeDirection::Buy,
        status: if closed.is_some() { TradeStatus::Closed } else { TradeStatus::Open },
        opened_at: Some(opened),
        closed_at: closed.map(|(at, _)| at),
        entry_price: 100.0,
        close_price: closed.map(|_| 101.0),
        sol_amount: 0.5,
        usdc_value: 50.0,
        realized_pnl: closed.map(|(_, pnl)| pnl),
        unrealized_pnl: None,
    }
}

pub fn write_points_csv(dir: &Path, points: &[SentimentPricePoint]) -> PathBuf {
    let path = dir.join("fgi_log.csv");
    let mut out = String::new();
    for p in points {
        out.push_str(&format!("\"{}\",{},{}\n", p.timestamp, p.price, p.value));
    }
    fs::write(&path, out).unwrap();
    path
}

pub fn write_trades_json(dir: &Path, trades: &[Trade]) -> PathBuf {
    let path = dir.join("orderBookStorage.json");
    let records: Vec<serde_json::Value> = trades
        .iter()
        .map(|t| {
            serde_json::json!({
                "id": t.id,
                "direction": t.direction.to_string(),
                "status": t.status.to_string(),
                "timestamp": t.opened_at.map(log_timestamp),
                "closedAt": t.closed_at.map(log_timestamp),
                "price": t.entry_price,
                "closePrice": t.close_price,
                "solAmount": t.sol_amount,
                "value": t.usdc_value,
                "realizedPnl": t.realized_pnl,
                "upnl": t.unrealized_pnl,
            })
        })
        .collect();
    fs::write(&path, serde_json::json!({ "trades": records }).to_string()).unwrap();
    path
}
