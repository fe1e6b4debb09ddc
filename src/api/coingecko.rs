use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::types::{self, MarketChartRange, SimplePriceResponse};
use crate::api::{HistorySource, PriceSource};
use crate::config::{ApiConfig, HistoryConfig};
use crate::error::{Error, Result};
use crate::models::{PricePoint, PriceSnapshot};

const API_KEY_HEADER: &str = "X-CG-Pro-API-Key";
const VS_CURRENCY: &str = "usd";

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    retry: HistoryConfig,
}

impl CoinGeckoClient {
    pub fn new(api: &ApiConfig, retry: HistoryConfig) -> Result<Self> {
        let client = Client::builder().timeout(api.request_timeout()).build()?;
        Ok(Self {
            client,
            api_key: api.api_key.clone(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        let mut request = self.client.get(format!("{}/{}", self.base_url, endpoint));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        request
    }

    /// Single attempt against `/simple/price`; 429 surfaces as `RateLimited`.
    pub async fn simple_price(&self, coin_ids: &[String]) -> Result<PriceSnapshot> {
        if coin_ids.is_empty() {
            return Err(Error::InvalidInput("coin id set must not be empty".into()));
        }

        let ids = coin_ids.join(",");
        let response = self
            .get("simple/price")
            .query(&[("ids", ids.as_str()), ("vs_currencies", VS_CURRENCY)])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("CoinGecko simple/price returned 429".into()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Price request failed with status {}: {}", status, message);
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body: SimplePriceResponse = decode(response).await?;
        Ok(types::into_snapshot(body))
    }

    /// `/coins/{id}/market_chart/range` behind the transport retry layer.
    pub async fn market_chart_range(
        &self,
        coin_id: &str,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>> {
        let endpoint = format!("coins/{}/market_chart/range", coin_id);
        let params = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("from", from_unix.to_string()),
            ("to", to_unix.to_string()),
        ];

        let response = self.send_with_retry(&endpoint, &params).await?;
        let body: MarketChartRange = decode(response).await?;
        Ok(body.into_points())
    }

    /// Retries connection failures and the configured status set with
    /// exponential backoff, up to `max_retries` extra attempts.
    async fn send_with_retry(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Response> {
        let mut retries = 0u32;

        loop {
            let (last_status, retry_hint) = match self.get(endpoint).query(params).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !self.retry.should_retry_status(status) {
                        let message = response.text().await.unwrap_or_default();
                        return Err(Error::UnexpectedStatus { status, message });
                    }
                    (Some(status), retry_after(&response))
                }
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    debug!("Transport error on {}: {}", endpoint, e);
                    (None, None)
                }
                Err(e) => return Err(Error::Network(e.to_string())),
            };

            if retries >= self.retry.max_retries {
                return Err(Error::RetriesExhausted {
                    attempts: retries + 1,
                    last_status,
                });
            }
            retries += 1;

            let backoff = self.retry.backoff_for(retries);
            let delay = retry_hint.map_or(backoff, |after| after.max(backoff));
            warn!(
                "Retrying {} ({}/{}) after {:?} (status: {:?})",
                endpoint, retries, self.retry.max_retries, delay, last_status
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!("Failed to parse response: {}", e);
        Error::MalformedResponse(e.to_string())
    })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_prices(&self, coin_ids: &[String]) -> Result<PriceSnapshot> {
        self.simple_price(coin_ids).await
    }
}

#[async_trait]
impl HistorySource for CoinGeckoClient {
    async fn fetch_range(
        &self,
        coin_id: &str,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>> {
        self.market_chart_range(coin_id, from_unix, to_unix).await
    }
}
