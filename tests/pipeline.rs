mod common;

use chrono::Duration;
use common::{create_test_trade, latest, points, write_points_csv, write_trades_json, YEAR};
use sentiment_dashboard::dashboard::{
    build_view, filter_by_time_range, Dashboard, FilterOptions, RefreshOutcome, TimeRange, ViewOptions,
};
use sentiment_dashboard::data_loader::{parse_trades_json, FileDataSource};
use sentiment_dashboard::models::Trade;
use sentiment_dashboard::timestamp::SourceZone;
use tempfile::TempDir;

#[test_log::test]
fn filtered_points_are_sorted_subsequence_for_every_range() {
    // Every 5 minutes over 8 days.
    let series = points(8 * 288, 5);
    for range in TimeRange::ALL {
        let view = filter_by_time_range(&series, range, &[], latest(), &FilterOptions::default());
        let cutoff = view.cutoff.unwrap();
        assert!(!view.density_fallback, "{} fell back", range);
        assert!(view.points.iter().all(|p| p.date >= cutoff && p.date <= latest()));
        assert!(view.points.windows(2).all(|w| w[0].unix_time_millis < w[1].unix_time_millis));
        let expected = (range.lookback().num_minutes() / 5 + 1) as usize;
        assert_eq!(view.points.len(), expected, "range {}", range);
    }
}

#[test_log::test]
fn recently_closed_old_trade_visible_only_on_short_ranges() {
    let series = points(200, 5);
    let now = latest();
    let trades = vec![
        create_test_trade("old", now - Duration::days(10), Some((now - Duration::hours(2), 4.0))),
        create_test_trade("fresh", now - Duration::minutes(15), None),
    ];

    for range in [TimeRange::OneHour, TimeRange::FourHours, TimeRange::TwelveHours, TimeRange::OneDay] {
        let view = filter_by_time_range(&series, range, &trades, now, &FilterOptions::default());
        let ids: Vec<&str> = view.trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "fresh"], "range {}", range);
    }
    for range in [TimeRange::ThreeDays, TimeRange::SevenDays] {
        let view = filter_by_time_range(&series, range, &trades, now, &FilterOptions::default());
        let ids: Vec<&str> = view.trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["fresh"], "range {}", range);
    }
}

#[test_log::test]
fn realized_pnl_does_not_depend_on_range() {
    let series = points(200, 5);
    let now = latest();
    let trades = vec![
        create_test_trade("a", now - Duration::days(6), Some((now - Duration::days(5), 5.0))),
        create_test_trade("b", now - Duration::minutes(50), Some((now - Duration::minutes(10), -2.0))),
        create_test_trade("c", now - Duration::minutes(20), None),
    ];

    for range in TimeRange::ALL {
        let view = build_view(&series, &trades, range, now, &ViewOptions::default());
        assert!((view.summary.total_realized_pnl - 3.0).abs() < 1e-12);
        assert_eq!(view.summary.closed_trade_count, 2);
    }
}

#[test_log::test]
fn markers_follow_visible_trades() {
    let series = points(200, 5);
    let now = latest();
    let trades = vec![
        create_test_trade("closed", now - Duration::minutes(42), Some((now - Duration::minutes(7), 1.5))),
        create_test_trade("open", now - Duration::minutes(3), None),
        create_test_trade("hidden", now - Duration::days(2), None),
    ];

    let view = build_view(&series, &trades, TimeRange::OneHour, now, &ViewOptions::default());
    let mut ids: Vec<&str> = view.markers.iter().map(|m| m.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["closed", "closed_close", "open"]);

    let close = view.markers.iter().find(|m| m.id == "closed_close").unwrap();
    assert_eq!(close.realized_pnl, Some(1.5));
    // Closest 5-minute point to 7 minutes before the latest is 5 minutes before.
    assert_eq!(close.unix_time_millis, (now - Duration::minutes(5)).timestamp_millis());
}

#[test_log::test]
fn recently_closed_trade_without_open_time_has_no_markers() {
    let series = points(200, 5);
    let now = latest();
    let trades = vec![Trade {
        opened_at: None,
        ..create_test_trade("unparsed", now, Some((now - Duration::hours(3), 2.0)))
    }];

    let view = build_view(&series, &trades, TimeRange::FourHours, now, &ViewOptions::default());
    assert_eq!(view.trades.len(), 1);
    assert!(view.markers.is_empty());
    assert!((view.summary.total_realized_pnl - 2.0).abs() < 1e-12);
}

#[test_log::test]
fn close_window_measured_in_the_log_zone() {
    // Log written at UTC-5. 08:00 local on 9 March is 13:00 UTC, 23h before `now`.
    let ledger = r#"{"trades": [
        {"id": "t-ny", "direction": "buy", "status": "closed",
         "timestamp": "Sat, 01/MAR, 09:00:00", "closedAt": "Sun, 09/MAR, 08:00:00",
         "price": 100.0, "closePrice": 101.0, "solAmount": 0.5, "value": 50.0,
         "realizedPnl": 0.5}
    ]}"#;
    let series = points(200, 5);
    let now = latest();

    let offset: SourceZone = "-05:00".parse().unwrap();
    let trades = parse_trades_json(ledger, YEAR, offset).unwrap();
    assert_eq!(trades[0].closed_at, Some(now - Duration::hours(23)));
    let view = filter_by_time_range(&series, TimeRange::OneDay, &trades, now, &FilterOptions::default());
    assert_eq!(view.trades.len(), 1);

    // Read as UTC the same close looks 28h old and drops out.
    let trades = parse_trades_json(ledger, YEAR, SourceZone::utc()).unwrap();
    let view = filter_by_time_range(&series, TimeRange::OneDay, &trades, now, &FilterOptions::default());
    assert!(view.trades.is_empty());
}

#[test_log::test(tokio::test)]
async fn dashboard_reads_files_and_builds_view() {
    let dir = TempDir::new().unwrap();
    let series = points(120, 5);
    let now = latest();
    let trades = vec![
        create_test_trade("t1", now - Duration::minutes(30), Some((now - Duration::minutes(10), 2.25))),
        create_test_trade("t2", now - Duration::minutes(5), None),
    ];
    let points_path = write_points_csv(dir.path(), &series);
    let trades_path = write_trades_json(dir.path(), &trades);

    let source = FileDataSource::new(points_path, trades_path, YEAR, SourceZone::utc());
    let dashboard = Dashboard::new(ViewOptions::default());
    let outcome = dashboard.refresh(&source).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Applied { points: 120, trades: 2 });

    let view = dashboard.view(TimeRange::OneHour, now).await;
    assert_eq!(view.range, TimeRange::OneHour);
    assert_eq!(view.points.len(), 13);
    assert_eq!(view.trades.len(), 2);
    assert_eq!(view.markers.len(), 3);
    assert_eq!(view.summary.current_price, 219.0);
    assert_eq!(view.summary.last_updated, Some(now));
    assert!((view.summary.price_min - 207.0 * 0.995).abs() < 1e-9);
    assert!((view.summary.price_max - 219.0 * 1.005).abs() < 1e-9);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["range"], "1h");
    assert_eq!(json["markers"].as_array().unwrap().len(), 3);
}

#[test_log::test(tokio::test)]
async fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let source = FileDataSource::new(
        dir.path().join("nope.csv"),
        dir.path().join("nope.json"),
        YEAR,
        SourceZone::utc(),
    );
    let dashboard = Dashboard::new(ViewOptions::default());
    assert!(dashboard.refresh(&source).await.is_err());

    let view = dashboard.view(TimeRange::FourHours, latest()).await;
    assert!(view.points.is_empty());
    assert_eq!(view.summary.current_value, 0);
}
