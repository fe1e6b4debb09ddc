use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::error::{Error, Result};
use crate::metrics::{MonitorStats, PollStats};
use crate::web::publisher::BroadcastPublisher;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Read-only handles the HTTP layer needs.
#[derive(Debug, Clone)]
pub struct AppState {
    pub publisher: BroadcastPublisher,
    pub poll_stats: Arc<PollStats>,
    pub monitor_stats: Arc<MonitorStats>,
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// `GET /`, `GET /ws` and `GET /health`.
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let ws = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_state(state.clone()))
        .map(|ws: Ws, state: Arc<AppState>| {
            ws.on_upgrade(move |socket| client_connected(socket, state))
        });

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .map(|state: Arc<AppState>| {
            warp::reply::json(&json!({
                "status": "ok",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "subscribers": state.publisher.subscriber_count(),
                "poll": state.poll_stats.snapshot(),
                "monitor": state.monitor_stats.snapshot(),
            }))
        });

    index.or(ws).or(health)
}

async fn client_connected(socket: WebSocket, state: Arc<AppState>) {
    let (mut tx, mut rx) = socket.split();
    let mut updates = state.publisher.subscribe();
    info!(
        "Dashboard client connected ({} subscribers)",
        state.publisher.subscriber_count()
    );

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => {
                    if tx.send(Message::text(message)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dashboard client lagging, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = rx.next() => match incoming {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Dashboard socket error: {}", e);
                    break;
                }
                None => break,
            },
        }
    }

    info!("Dashboard client disconnected");
}

pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn start(&self, host: &str, port: u16) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}:{}: {}", host, port, e)))?;

        info!("Starting web server on {}", addr);
        warp::serve(routes(self.state.clone())).run(addr).await;
        Ok(())
    }
}
