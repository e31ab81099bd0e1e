use crate::error::{Error, Result};
use crate::models::{SentimentPricePoint, Trade, TradeDirection, TradeStatus};
use crate::models::market::sort_chronologically;
use crate::timestamp::{parse_custom_date, SourceZone};
use crate::validation::{validate_amount, validate_price, validate_sentiment, validate_trade_id};
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::fs::File;
use log::{info, warn, error};

/// Where the dashboard gets its two datasets from. A load either yields the
/// whole dataset or fails; bad individual records are skipped, not errors.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn load_points(&self) -> Result<Vec<SentimentPricePoint>>;
    async fn load_trades(&self) -> Result<Vec<Trade>>;
}

/// Reads the sentiment log (CSV) and the trade ledger (JSON) from disk.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    points_path: PathBuf,
    trades_path: PathBuf,
    year: i32,
    zone: SourceZone,
}

impl FileDataSource {
    pub fn new(
        points_path: impl Into<PathBuf>,
        trades_path: impl Into<PathBuf>,
        year: i32,
        zone: SourceZone,
    ) -> Self {
        Self {
            points_path: points_path.into(),
            trades_path: trades_path.into(),
            year,
            zone,
        }
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn load_points(&self) -> Result<Vec<SentimentPricePoint>> {
        let contents = tokio::fs::read(&self.points_path).await.map_err(|e| {
            error!("Failed to read points file {:?}: {}", self.points_path, e);
            Error::IoError(e)
        })?;
        let points = parse_points_csv(contents.as_slice(), self.year, self.zone)?;
        info!("Loaded {} points from {:?}", points.len(), self.points_path);
        Ok(points)
    }

    async fn load_trades(&self) -> Result<Vec<Trade>> {
        let contents = tokio::fs::read_to_string(&self.trades_path).await.map_err(|e| {
            error!("Failed to read trades file {:?}: {}", self.trades_path, e);
            Error::IoError(e)
        })?;
        let trades = parse_trades_json(&contents, self.year, self.zone)?;
        info!("Loaded {} trades from {:?}", trades.len(), self.trades_path);
        Ok(trades)
    }
}

/// Loads the sentiment/price log from a header-less CSV file.
///
/// Each row is `timestamp,price,value`, e.g. `"Sat, 22/FEB, 21:29:26",172.77,52`.
/// Rows with missing fields, non-numeric values, an unparseable timestamp or
/// out-of-range values are skipped. The result is sorted by time.
pub fn load_points_from_csv(file_path: &Path, year: i32, zone: SourceZone) -> Result<Vec<SentimentPricePoint>> {
    info!("Attempting to load points from CSV: {:?}", file_path);

    let file = File::open(file_path).map_err(|e| {
        error!("Failed to open CSV file {:?}: {}", file_path, e);
        Error::IoError(e)
    })?;

    let points = parse_points_csv(file, year, zone)?;
    info!("Successfully loaded {} points from CSV: {:?}", points.len(), file_path);
    Ok(points)
}

pub fn parse_points_csv<R: Read>(reader: R, year: i32, zone: SourceZone) -> Result<Vec<SentimentPricePoint>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 1;
        let record = match result {
            Ok(rec) => rec,
            Err(e) => {
                warn!("Skipping malformed CSV record on line {}: {}", line, e);
                continue;
            }
        };

        if record.len() < 3 {
            warn!("Skipping record on line {}: expected 3 fields, got {}", line, record.len());
            continue;
        }

        let raw_timestamp = record.get(0).unwrap_or("");
        let price: f64 = match record.get(1).unwrap_or("").parse() {
            Ok(p) => p,
            Err(_) => {
                warn!("Skipping record on line {}: invalid price '{}'", line, record.get(1).unwrap_or("[missing]"));
                continue;
            }
        };
        let raw_value: f64 = match record.get(2).unwrap_or("").parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Skipping record on line {}: invalid sentiment '{}'", line, record.get(2).unwrap_or("[missing]"));
                continue;
            }
        };

        if let Err(e) = validate_price(price) {
            warn!("Skipping record on line {}: {}", line, e);
            continue;
        }
        let value = match validate_sentiment(raw_value) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping record on line {}: {}", line, e);
                continue;
            }
        };

        let date = match parse_custom_date(raw_timestamp, year, zone) {
            Some(d) => d,
            None => {
                warn!("Skipping record on line {}: unparseable timestamp '{}'", line, raw_timestamp);
                continue;
            }
        };

        points.push(SentimentPricePoint::new(raw_timestamp, date, price, value));
    }

    sort_chronologically(&mut points);
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct TradeLedger {
    trades: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeRecord {
    id: String,
    direction: TradeDirection,
    status: TradeStatus,
    timestamp: Option<String>,
    closed_at: Option<String>,
    price: f64,
    close_price: Option<f64>,
    sol_amount: f64,
    value: f64,
    realized_pnl: Option<f64>,
    upnl: Option<f64>,
}

pub fn load_trades_from_json(file_path: &Path, year: i32, zone: SourceZone) -> Result<Vec<Trade>> {
    info!("Attempting to load trades from JSON: {:?}", file_path);
    let contents = std::fs::read_to_string(file_path).map_err(|e| {
        error!("Failed to open trades file {:?}: {}", file_path, e);
        Error::IoError(e)
    })?;
    let trades = parse_trades_json(&contents, year, zone)?;
    info!("Successfully loaded {} trades from JSON: {:?}", trades.len(), file_path);
    Ok(trades)
}

/// Decodes a `{ "trades": [...] }` ledger. The document itself must be valid;
/// individual trades that fail to decode or validate are skipped, as are
/// repeated ids (the first occurrence wins).
pub fn parse_trades_json(contents: &str, year: i32, zone: SourceZone) -> Result<Vec<Trade>> {
    let ledger: TradeLedger = serde_json::from_str(contents)?;
    let mut seen = HashSet::new();
    let mut trades = Vec::with_capacity(ledger.trades.len());

    for (idx, raw) in ledger.trades.into_iter().enumerate() {
        let record: TradeRecord = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping trade #{}: {}", idx, e);
                continue;
            }
        };

        let trade = match into_trade(record, year, zone) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping trade #{}: {}", idx, e);
                continue;
            }
        };

        if !seen.insert(trade.id.clone()) {
            warn!("Skipping trade #{}: duplicate id '{}'", idx, trade.id);
            continue;
        }
        trades.push(trade);
    }

    Ok(trades)
}

fn into_trade(record: TradeRecord, year: i32, zone: SourceZone) -> Result<Trade> {
    validate_trade_id(&record.id)?;
    validate_price(record.price)?;
    validate_amount(record.sol_amount)?;
    validate_amount(record.value)?;

    let opened_at = record
        .timestamp
        .as_deref()
        .and_then(|raw| parse_custom_date(raw, year, zone));
    if opened_at.is_none() {
        warn!(
            "Trade '{}' has an unparseable open timestamp {:?}; it will not be charted",
            record.id, record.timestamp
        );
    }

    let (closed_at, close_price, realized_pnl) = match record.status {
        TradeStatus::Closed => {
            let closed_at = record
                .closed_at
                .as_deref()
                .and_then(|raw| parse_custom_date(raw, year, zone));
            if record.closed_at.is_some() && closed_at.is_none() {
                warn!("Trade '{}' has an unparseable close timestamp {:?}", record.id, record.closed_at);
            }
            let close_price = record.close_price.and_then(|p| match validate_price(p) {
                Ok(()) => Some(p),
                Err(e) => {
                    warn!("Trade '{}' has an invalid close price ({}); it gets no close marker", record.id, e);
                    None
                }
            });
            (closed_at, close_price, record.realized_pnl)
        }
        TradeStatus::Open => {
            if record.closed_at.is_some() || record.close_price.is_some() || record.realized_pnl.is_some() {
                warn!("Open trade '{}' carries close-side fields; ignoring them", record.id);
            }
            (None, None, None)
        }
    };

    Ok(Trade {
        id: record.id,
        direction: record.direction,
        status: record.status,
        opened_at,
        closed_at,
        entry_price: record.price,
        close_price,
        sol_amount: record.sol_amount,
        usdc_value: record.value,
        realized_pnl,
        unrealized_pnl: record.upnl,
    })
}
