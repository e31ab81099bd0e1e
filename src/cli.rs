use clap::Parser;
use std::path::PathBuf;
use crate::dashboard::TimeRange;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Lookback window: 1h, 4h, 12h, 1d, 3d or 7d
    #[arg(short, long)]
    pub range: Option<TimeRange>,

    /// Sentiment/price CSV log (overrides the config)
    #[arg(long)]
    pub points: Option<PathBuf>,

    /// Trade ledger JSON (overrides the config)
    #[arg(long)]
    pub trades: Option<PathBuf>,

    /// Year for timestamps that do not carry one
    #[arg(long)]
    pub year: Option<i32>,

    /// Zone the logs were written in: local, utc or an offset like -05:00
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<String>,

    /// Print the full view as JSON instead of the text summary
    #[arg(long)]
    pub json: bool,

    /// Keep refreshing on the configured interval until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}
