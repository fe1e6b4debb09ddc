use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, error, warn};
use std::sync::Arc;

use crate::api::HistorySource;
use crate::config::HistoryConfig;
use crate::models::HistoricalSeries;

/// Trailing-window history with a coarse, bounded retry on top of whatever
/// retrying the source does itself.
#[derive(Clone)]
pub struct HistoricalFetcher {
    source: Arc<dyn HistorySource>,
    config: HistoryConfig,
}

impl HistoricalFetcher {
    pub fn new(source: Arc<dyn HistorySource>, config: HistoryConfig) -> Self {
        Self { source, config }
    }

    /// Never fails: an irrecoverable fetch comes back as an empty series.
    pub async fn fetch_history(&self, coin_id: &str, window_days: u32) -> HistoricalSeries {
        if window_days == 0 {
            error!("History window for {} must be at least one day", coin_id);
            return HistoricalSeries::empty(coin_id);
        }

        let window = ChronoDuration::days(i64::from(window_days));
        let mut coarse_retries = 0u32;
        loop {
            let to = Utc::now();
            let Some(from) = to.checked_sub_signed(window) else {
                error!(
                    "History window of {} days for {} is out of range",
                    window_days, coin_id
                );
                return HistoricalSeries::empty(coin_id);
            };

            match self
                .source
                .fetch_range(coin_id, from.timestamp(), to.timestamp())
                .await
            {
                Ok(points) => {
                    let series = HistoricalSeries::from_points(coin_id, points);
                    debug!("Fetched {} history points for {}", series.len(), coin_id);
                    return series;
                }
                Err(e) if e.is_transient() && coarse_retries < self.config.coarse_retries => {
                    coarse_retries += 1;
                    warn!(
                        "HTTP error occurred for {}: {}. Retrying in {:?} ({}/{})",
                        coin_id,
                        e,
                        self.config.coarse_retry_delay(),
                        coarse_retries,
                        self.config.coarse_retries
                    );
                    tokio::time::sleep(self.config.coarse_retry_delay()).await;
                }
                Err(e) => {
                    error!("Giving up on history for {}: {}", coin_id, e);
                    return HistoricalSeries::empty(coin_id);
                }
            }
        }
    }
}
