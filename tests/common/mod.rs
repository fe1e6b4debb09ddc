#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warp::http::{Response, StatusCode};
use warp::path::FullPath;
use warp::Filter;

use coin_forecast::config::{ApiConfig, Config, HistoryConfig, NotificationBackend, PollConfig};

/// Defaults with millisecond backoffs and the upstream pointed at `base_url`.
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            api_key: None,
            request_timeout_secs: 5.0,
        },
        coins: vec!["bitcoin".to_string()],
        poll: PollConfig {
            interval_secs: 30.0,
            rate_limit_backoff_secs: 0.05,
            error_backoff_secs: 0.05,
            publish_timeout_secs: 1.0,
            stuck_warning_every: 10,
        },
        history: HistoryConfig {
            backoff_factor_secs: 0.001,
            coarse_retry_delay_secs: 0.01,
            ..HistoryConfig::default()
        },
        ..Config::default()
    };
    config.notifications.backend = NotificationBackend::Log;
    config
}

/// A scripted stand-in for the CoinGecko API.
pub struct FakeUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v3", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `path?query` of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// What the fake upstream sends for one request.
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
    pub retry_after_secs: Option<u64>,
}

/// `responder(hit_index, path)` returns the status code and JSON body to send.
pub async fn spawn_upstream<F>(responder: F) -> FakeUpstream
where
    F: Fn(usize, &str) -> (u16, String) + Send + Sync + 'static,
{
    spawn_upstream_with(move |index, path| {
        let (status, body) = responder(index, path);
        UpstreamReply {
            status,
            body,
            retry_after_secs: None,
        }
    })
    .await
}

/// Like [`spawn_upstream`] but the responder also controls `Retry-After`.
pub async fn spawn_upstream_with<F>(responder: F) -> FakeUpstream
where
    F: Fn(usize, &str) -> UpstreamReply + Send + Sync + 'static,
{
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let responder = Arc::new(responder);

    let route = {
        let hits = hits.clone();
        let requests = requests.clone();
        warp::path::full()
            .and(
                warp::query::raw()
                    .or(warp::any().map(String::new))
                    .unify(),
            )
            .map(move |path: FullPath, query: String| {
                let index = hits.fetch_add(1, Ordering::SeqCst);
                requests
                    .lock()
                    .unwrap()
                    .push(format!("{}?{}", path.as_str(), query));
                let reply = responder.as_ref()(index, path.as_str());
                let mut builder = Response::builder()
                    .status(StatusCode::from_u16(reply.status).unwrap())
                    .header("content-type", "application/json");
                if let Some(secs) = reply.retry_after_secs {
                    builder = builder.header("retry-after", secs.to_string());
                }
                builder.body(reply.body).unwrap()
            })
    };

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    FakeUpstream {
        addr,
        hits,
        requests,
    }
}

/// A base URL on a local port nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v3", addr)
}

/// `{"prices": [[ms, price], ...]}` one hour apart.
pub fn market_chart_body(prices: &[f64]) -> String {
    let pairs: Vec<serde_json::Value> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| serde_json::json!([1_700_000_000_000i64 + i as i64 * 3_600_000, p]))
        .collect();
    serde_json::json!({ "prices": pairs, "market_caps": [], "total_volumes": [] }).to_string()
}
