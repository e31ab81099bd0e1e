use anyhow::Result;
use clap::Parser;
use log::{info, error, LevelFilter};
use std::path::PathBuf;
use std::time::Duration;
use chrono::Utc;
use tokio::time::interval;

use sentiment_dashboard::cli::Cli;
use sentiment_dashboard::config::Config;
use sentiment_dashboard::dashboard::{Dashboard, DashboardView, RefreshOutcome, TimeRange};
use sentiment_dashboard::data_loader::FileDataSource;
use sentiment_dashboard::timestamp::{self, SourceZone};
use sentiment_dashboard::logging;

const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config, cli.debug)?;
    info!("Starting sentiment dashboard...");

    let year = timestamp::resolve_year(cli.year.or(config.data.year));
    let points_path = cli.points.clone().unwrap_or_else(|| config.data.points_path.clone());
    let trades_path = cli.trades.clone().unwrap_or_else(|| config.data.trades_path.clone());
    let zone = match &cli.utc_offset {
        Some(offset) => offset.parse::<SourceZone>()?,
        None => config.data.zone()?,
    };
    info!(
        "Points: {:?}, trades: {:?}, year: {}, zone: {}",
        points_path, trades_path, year, zone
    );

    let source = FileDataSource::new(points_path, trades_path, year, zone);
    let dashboard = Dashboard::new(config.view.to_options()?);
    let range = cli.range.unwrap_or(config.view.default_range);

    refresh_and_print(&dashboard, &source, range, cli.json).await?;

    if !cli.watch {
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(config.refresh.interval_secs));
    // The first tick fires immediately and the initial load already ran.
    ticker.tick().await;
    info!("Refreshing every {}s, Ctrl-C to stop", config.refresh.interval_secs);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = refresh_and_print(&dashboard, &source, range, cli.json).await {
                    error!("Refresh failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path)
            .map_err(|e| anyhow::anyhow!("Configuration loading failed for {:?}: {}", path, e)),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn init_logging(config: &Config, debug: bool) -> Result<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        logging::parse_level(&config.logging.level)
    };

    match &config.logging.file {
        Some(file) => logging::init(file, level),
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .init();
            Ok(())
        }
    }
}

async fn refresh_and_print(
    dashboard: &Dashboard,
    source: &FileDataSource,
    range: TimeRange,
    json: bool,
) -> Result<()> {
    if dashboard.refresh(source).await? == RefreshOutcome::Superseded {
        return Ok(());
    }
    let view = dashboard.view(range, Utc::now()).await;
    print_view(&view, json)
}

fn print_view(view: &DashboardView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        println!("{}\n", view.render());
    }
    Ok(())
}
