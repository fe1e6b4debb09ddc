use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use coin_forecast::metrics::{MonitorStats, PollStats};
use coin_forecast::web::{routes, AppState, BroadcastPublisher, Publisher, UPDATE_EVENT};

#[tokio::test]
async fn test_websocket_client_receives_update_data() {
    let publisher = BroadcastPublisher::new();
    let state = Arc::new(AppState {
        publisher: publisher.clone(),
        poll_stats: Arc::new(PollStats::new()),
        monitor_stats: Arc::new(MonitorStats::new()),
    });
    let (addr, server) = warp::serve(routes(state)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let (mut socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while publisher.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("server subscribed the client");

    let delivered = publisher
        .publish(
            UPDATE_EVENT,
            json!({
                "prices": {"bitcoin": 6000.0, "ethereum": 1500.0, "cardano": 3000.0},
                "recommendations": {"bitcoin": "Sell", "ethereum": "Buy", "cardano": "Hold"}
            }),
        )
        .await
        .unwrap();
    assert_eq!(delivered, 1);

    let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = match message {
        Message::Text(text) => text,
        other => panic!("expected text frame, got {:?}", other),
    };
    let envelope: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(envelope["event"], "update_data");
    assert_eq!(envelope["data"]["recommendations"]["ethereum"], "Buy");
}

#[tokio::test]
async fn test_health_endpoint_over_http() {
    let state = Arc::new(AppState {
        publisher: BroadcastPublisher::new(),
        poll_stats: Arc::new(PollStats::new()),
        monitor_stats: Arc::new(MonitorStats::new()),
    });
    let (addr, server) = warp::serve(routes(state)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 0);
    assert_eq!(body["poll"]["publishes"], 0);
}
