use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::models::{PricePoint, PriceSnapshot};

pub mod coingecko;
pub mod types;

pub use coingecko::CoinGeckoClient;

/// Spot prices for a set of coins.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns `Error::RateLimited` on HTTP 429 so the caller can own the wait.
    async fn fetch_prices(&self, coin_ids: &[String]) -> Result<PriceSnapshot>;
}

/// Historical `(timestamp, price)` points between two Unix timestamps (seconds).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_range(
        &self,
        coin_id: &str,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>>;
}
