use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::Result;
use chrono::Duration;
use crate::dashboard::{FilterOptions, TimeRange, ViewOptions};
use crate::timestamp::SourceZone;

/// One year.
pub const MAX_RECENT_CLOSE_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub view: ViewConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub points_path: PathBuf,
    pub trades_path: PathBuf,
    /// Year for timestamps that do not carry one. Defaults to the current year.
    pub year: Option<i32>,
    /// Zone the log timestamps were written in: `local`, `utc` or `+HH:MM`.
    pub utc_offset: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub default_range: TimeRange,
    pub min_visible_points: usize,
    pub recent_close_window_hours: i64,
    pub price_padding: f64,
    pub auto_widen_below: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            points_path: PathBuf::from("data/fgi_log.csv"),
            trades_path: PathBuf::from("data/orderBookStorage.json"),
            year: None,
            utc_offset: "local".to_string(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_range: TimeRange::FourHours,
            min_visible_points: 10,
            recent_close_window_hours: 24,
            price_padding: 0.005,
            auto_widen_below: 5,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl DataConfig {
    pub fn zone(&self) -> Result<SourceZone> {
        Ok(self.utc_offset.parse::<SourceZone>()?)
    }
}

impl ViewConfig {
    pub fn to_options(&self) -> Result<ViewOptions> {
        let recent_close_window = Duration::try_hours(self.recent_close_window_hours)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "view.recent_close_window_hours out of range: {}",
                    self.recent_close_window_hours
                )
            })?;
        Ok(ViewOptions {
            filter: FilterOptions {
                min_visible_points: self.min_visible_points,
                recent_close_window,
            },
            price_padding: self.price_padding,
            auto_widen_below: self.auto_widen_below,
        })
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.view.price_padding) {
            anyhow::bail!("view.price_padding must be in [0, 1), got {}", self.view.price_padding);
        }
        if !(0..=MAX_RECENT_CLOSE_WINDOW_HOURS).contains(&self.view.recent_close_window_hours) {
            anyhow::bail!(
                "view.recent_close_window_hours must be in [0, {}], got {}",
                MAX_RECENT_CLOSE_WINDOW_HOURS,
                self.view.recent_close_window_hours
            );
        }
        self.data.zone()?;
        if self.refresh.interval_secs == 0 {
            anyhow::bail!("refresh.interval_secs must be at least 1");
        }
        Ok(())
    }
}
