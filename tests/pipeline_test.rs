mod common;

use std::sync::Arc;
use std::time::Duration;

use coin_forecast::api::CoinGeckoClient;
use coin_forecast::metrics::{MonitorStats, PollStats};
use coin_forecast::monitoring::LogNotifier;
use coin_forecast::services::{HistoricalFetcher, Monitor, PollLoop};
use coin_forecast::strategies::ThresholdRecommender;
use coin_forecast::web::BroadcastPublisher;

use common::{create_test_config, market_chart_body, spawn_upstream};

#[test_log::test(tokio::test)]
async fn test_poll_loop_recovers_from_rate_limit_and_publishes_once() {
    let upstream = spawn_upstream(|hit, _| match hit {
        0 => (429, String::new()),
        _ => (200, r#"{"bitcoin": {"usd": 100}}"#.to_string()),
    })
    .await;
    let config = create_test_config(&upstream.base_url());
    let client = Arc::new(CoinGeckoClient::new(&config.api, config.history.clone()).unwrap());

    let publisher = BroadcastPublisher::new();
    let mut updates = publisher.subscribe();
    let stats = Arc::new(PollStats::new());
    let poll = PollLoop::new(
        &config,
        client,
        Arc::new(ThresholdRecommender::new(config.thresholds)),
        Arc::new(publisher),
        stats.clone(),
    );
    let task = tokio::spawn(poll.run());

    let message = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("an update within the timeout")
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&message).unwrap();
    assert_eq!(envelope["event"], "update_data");
    assert_eq!(
        envelope["data"],
        serde_json::json!({
            "prices": {"bitcoin": 100.0},
            "recommendations": {"bitcoin": "Buy"}
        })
    );

    // The next fetch is 30s away, so nothing else arrives for this cycle.
    assert!(tokio::time::timeout(Duration::from_millis(200), updates.recv())
        .await
        .is_err());
    task.abort();

    assert_eq!(upstream.hits(), 2);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.rate_limited, 1);
    assert_eq!(snapshot.consecutive_rate_limited, 0);
    assert_eq!(snapshot.publishes, 1);
}

#[tokio::test]
async fn test_monitor_round_against_upstream() {
    let upstream = spawn_upstream(|_, path| {
        if path.contains("/coins/bitcoin/") {
            (200, market_chart_body(&[100.0, 110.0, 120.0, 130.0, 140.0]))
        } else {
            (500, String::new())
        }
    })
    .await;
    let mut config = create_test_config(&upstream.base_url());
    config.coins = vec!["bitcoin".to_string(), "ethereum".to_string()];
    let client = Arc::new(CoinGeckoClient::new(&config.api, config.history.clone()).unwrap());

    let stats = Arc::new(MonitorStats::new());
    let monitor = Monitor::new(
        &config,
        HistoricalFetcher::new(client, config.history.clone()),
        Arc::new(LogNotifier),
        stats.clone(),
    );

    let reports = monitor.run_round().await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.coin_id, "bitcoin");
    assert_eq!(report.current_price, 140.0);
    assert_eq!(report.forecast.len(), 7);
    assert!((report.peak_forecast - 210.0).abs() < 1e-6);
    assert_eq!(report.title(), "Bitcoin Price Forecast");
    assert!(report.message().contains("Forecasted Price: $210.00"));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.notifications, 1);
    assert_eq!(snapshot.skipped, 1);
}
