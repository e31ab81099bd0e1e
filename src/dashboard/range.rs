use crate::error::{Error, Result};
use crate::models::{SentimentPricePoint, Trade};
use crate::models::market::sort_chronologically;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use log::debug;

/// User-selected lookback window, measured back from the latest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    #[default]
    FourHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
}

impl TimeRange {
    /// All tokens, shortest first.
    pub const ALL: [TimeRange; 6] = [
        TimeRange::OneHour,
        TimeRange::FourHours,
        TimeRange::TwelveHours,
        TimeRange::OneDay,
        TimeRange::ThreeDays,
        TimeRange::SevenDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::FourHours => "4h",
            TimeRange::TwelveHours => "12h",
            TimeRange::OneDay => "1d",
            TimeRange::ThreeDays => "3d",
            TimeRange::SevenDays => "7d",
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            TimeRange::OneHour => Duration::hours(1),
            TimeRange::FourHours => Duration::hours(4),
            TimeRange::TwelveHours => Duration::hours(12),
            TimeRange::OneDay => Duration::days(1),
            TimeRange::ThreeDays => Duration::days(3),
            TimeRange::SevenDays => Duration::days(7),
        }
    }

    /// Short ranges also show trades that closed recently, whenever they opened.
    pub fn includes_recent_closed(&self) -> bool {
        matches!(
            self,
            TimeRange::OneHour | TimeRange::FourHours | TimeRange::TwelveHours | TimeRange::OneDay
        )
    }

    /// Next longer token, `None` for 7d.
    pub fn wider(&self) -> Option<TimeRange> {
        let idx = Self::ALL.iter().position(|r| r == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// X-axis tick label: time only for sub-day ranges, day/month and time otherwise.
    pub fn format_axis_label(&self, at: DateTime<Utc>) -> String {
        match self {
            TimeRange::OneHour | TimeRange::FourHours | TimeRange::TwelveHours => {
                at.format("%H:%M").to_string()
            }
            _ => at.format("%d/%m %H:%M").to_string(),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_lowercase();
        TimeRange::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == token)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unknown time range '{}', expected one of 1h, 4h, 12h, 1d, 3d, 7d",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOptions {
    /// The chart never shows fewer points than this when the series has them.
    pub min_visible_points: usize,
    /// How far back from `now` a close counts as recent for short ranges.
    pub recent_close_window: Duration,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            min_visible_points: 10,
            recent_close_window: Duration::hours(24),
        }
    }
}

/// Points and trades visible for one range selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    pub range: TimeRange,
    pub cutoff: Option<DateTime<Utc>>,
    pub points: Vec<SentimentPricePoint>,
    pub trades: Vec<Trade>,
    pub density_fallback: bool,
}

impl FilteredView {
    fn empty(range: TimeRange) -> Self {
        Self {
            range,
            cutoff: None,
            points: Vec::new(),
            trades: Vec::new(),
            density_fallback: false,
        }
    }
}

/// Computes the visible subsets of `points` and `trades` for `range`.
///
/// Points at or after `latest - lookback` are kept; when that leaves fewer
/// than `min_visible_points` and the series has at least that many, the last
/// `min_visible_points` are shown instead. Trades are visible when they opened
/// at or after the cutoff, or, for short ranges, when they closed within
/// `recent_close_window` of `now`. Trades are deduplicated by id and ordered
/// by open time. The inputs are never modified.
pub fn filter_by_time_range(
    points: &[SentimentPricePoint],
    range: TimeRange,
    trades: &[Trade],
    now: DateTime<Utc>,
    options: &FilterOptions,
) -> FilteredView {
    if points.is_empty() {
        return FilteredView::empty(range);
    }

    let mut sorted = points.to_vec();
    sort_chronologically(&mut sorted);

    let latest = match sorted.last() {
        Some(p) => p.date,
        None => return FilteredView::empty(range),
    };
    let cutoff = latest - range.lookback();
    let cutoff_ms = cutoff.timestamp_millis();

    let mut visible: Vec<SentimentPricePoint> = sorted
        .iter()
        .filter(|p| p.unix_time_millis >= cutoff_ms)
        .cloned()
        .collect();

    let min = options.min_visible_points;
    let density_fallback = visible.len() < min && sorted.len() >= min;
    if density_fallback {
        debug!(
            "Range {} has {} points; showing the last {} instead",
            range,
            visible.len(),
            min
        );
        visible = sorted[sorted.len() - min..].to_vec();
    }

    let visible_trades = select_trades(trades, range, cutoff, now, options);

    FilteredView {
        range,
        cutoff: Some(cutoff),
        points: visible,
        trades: visible_trades,
        density_fallback,
    }
}

fn select_trades(
    trades: &[Trade],
    range: TimeRange,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
    options: &FilterOptions,
) -> Vec<Trade> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected: Vec<Trade> = Vec::new();

    for trade in trades {
        let opened_in_range = trade.opened_at.map_or(false, |opened| opened >= cutoff);
        if opened_in_range && seen.insert(trade.id.as_str()) {
            selected.push(trade.clone());
        }
    }

    if range.includes_recent_closed() {
        let recent_floor = now - options.recent_close_window;
        for trade in trades {
            let closed_recently =
                trade.is_closed() && trade.closed_at.map_or(false, |closed| closed >= recent_floor);
            if closed_recently && seen.insert(trade.id.as_str()) {
                selected.push(trade.clone());
            }
        }
    }

    selected.sort_by_key(|t| t.opened_at);
    selected
}
