use crate::data_loader::DataSource;
use crate::error::Result;
use crate::models::{SentimentPricePoint, Trade};
use crate::models::market::sort_chronologically;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

pub mod aggregates;
pub mod markers;
pub mod matcher;
pub mod range;

pub use aggregates::{compute_summary, DashboardSummary, Sentiment};
pub use markers::{build_trade_markers, MarkerKind, TradeMarker};
pub use matcher::closest_point;
pub use range::{filter_by_time_range, FilterOptions, FilteredView, TimeRange};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub filter: FilterOptions,
    pub price_padding: f64,
    /// Widen the range while fewer points than this are visible. 0 disables.
    pub auto_widen_below: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: FilterOptions::default(),
            price_padding: aggregates::DEFAULT_PRICE_PADDING,
            auto_widen_below: 5,
        }
    }
}

/// Everything the presentation layer needs for one range selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub requested_range: TimeRange,
    pub range: TimeRange,
    pub cutoff: Option<DateTime<Utc>>,
    pub density_fallback: bool,
    pub points: Vec<SentimentPricePoint>,
    pub trades: Vec<Trade>,
    pub markers: Vec<TradeMarker>,
    pub summary: DashboardSummary,
    pub generated_at: DateTime<Utc>,
}

impl DashboardView {
    pub fn render(&self) -> String {
        let range = if self.range == self.requested_range {
            self.range.to_string()
        } else {
            format!("{} (widened from {})", self.range, self.requested_range)
        };
        let span = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => format!(
                "{} - {}",
                self.range.format_axis_label(first.date),
                self.range.format_axis_label(last.date)
            ),
            _ => "-".to_string(),
        };
        let opens = self.markers.iter().filter(|m| m.is_open()).count();
        format!(
            "{}\n\
             Range: {}\n\
             Chart: {} points, {}\n\
             Positions: {} visible, {} open markers, {} close markers",
            self.summary.render(),
            range,
            self.points.len(),
            span,
            self.trades.len(),
            opens,
            self.markers.len() - opens
        )
    }
}

/// Runs filter, marker and aggregate steps over the full datasets.
///
/// Markers are matched against the full point series so trades that surface
/// through the recently-closed rule still land on their true instant.
pub fn build_view(
    points: &[SentimentPricePoint],
    trades: &[Trade],
    requested: TimeRange,
    now: DateTime<Utc>,
    options: &ViewOptions,
) -> DashboardView {
    let mut range = requested;
    let mut filtered = filter_by_time_range(points, range, trades, now, &options.filter);

    while !points.is_empty() && filtered.points.len() < options.auto_widen_below {
        let Some(wider) = range.wider() else {
            break;
        };
        debug!(
            "Range {} shows only {} points; widening to {}",
            range,
            filtered.points.len(),
            wider
        );
        range = wider;
        filtered = filter_by_time_range(points, range, trades, now, &options.filter);
    }

    let markers = build_trade_markers(&filtered.trades, points);
    let summary = compute_summary(points, &filtered.points, trades, options.price_padding);

    DashboardView {
        requested_range: requested,
        range,
        cutoff: filtered.cutoff,
        density_fallback: filtered.density_fallback,
        points: filtered.points,
        trades: filtered.trades,
        markers,
        summary,
        generated_at: now,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { points: usize, trades: usize },
    /// A newer refresh started while this one was loading; its data was dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct DashboardData {
    points: Vec<SentimentPricePoint>,
    trades: Vec<Trade>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Holds the full datasets between refreshes and derives views on demand.
pub struct Dashboard {
    data: Arc<RwLock<DashboardData>>,
    generation: Arc<AtomicU64>,
    options: ViewOptions,
}

impl Dashboard {
    pub fn new(options: ViewOptions) -> Self {
        Self {
            data: Arc::new(RwLock::new(DashboardData::default())),
            generation: Arc::new(AtomicU64::new(0)),
            options,
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Reloads both datasets from `source`. The most recently started
    /// refresh wins: a load that finishes after a newer refresh began is
    /// discarded. On error the current datasets are kept.
    pub async fn refresh<S: DataSource + ?Sized>(&self, source: &S) -> Result<RefreshOutcome> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let loaded = async {
            let points = source.load_points().await?;
            let trades = source.load_trades().await?;
            Ok::<_, crate::error::Error>((points, trades))
        }
        .await;

        let (points, trades) = match loaded {
            Ok(data) => data,
            Err(e) => {
                warn!("Refresh #{} failed, keeping previous data: {}", ticket, e);
                return Err(e);
            }
        };

        let mut data = self.data.write().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("Refresh #{} superseded by a newer refresh", ticket);
            return Ok(RefreshOutcome::Superseded);
        }
        let outcome = RefreshOutcome::Applied {
            points: points.len(),
            trades: trades.len(),
        };
        Self::store(&mut data, points, trades);
        info!("Refresh #{} applied: {:?}", ticket, outcome);
        Ok(outcome)
    }

    /// Replaces the datasets directly, superseding any refresh in flight.
    pub async fn replace_data(&self, points: Vec<SentimentPricePoint>, trades: Vec<Trade>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut data = self.data.write().await;
        Self::store(&mut data, points, trades);
    }

    fn store(data: &mut DashboardData, mut points: Vec<SentimentPricePoint>, trades: Vec<Trade>) {
        sort_chronologically(&mut points);
        data.points = points;
        data.trades = trades;
        data.loaded_at = Some(Utc::now());
    }

    pub async fn view(&self, range: TimeRange, now: DateTime<Utc>) -> DashboardView {
        let data = self.data.read().await;
        build_view(&data.points, &data.trades, range, now, &self.options)
    }

    pub async fn summary(&self, range: TimeRange, now: DateTime<Utc>) -> DashboardSummary {
        self.view(range, now).await.summary
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.data.read().await.loaded_at
    }

    pub async fn counts(&self) -> (usize, usize) {
        let data = self.data.read().await;
        (data.points.len(), data.trades.len())
    }
}
