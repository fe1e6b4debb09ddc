use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::metrics::MonitorStats;
use crate::ml::{Forecast, Forecaster};
use crate::monitoring::Notifier;
use crate::services::history::HistoricalFetcher;

/// What a successful pass over one coin produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinReport {
    pub coin_id: String,
    pub current_price: f64,
    pub as_of: DateTime<Utc>,
    pub peak_forecast: f64,
    pub forecast: Forecast,
}

impl CoinReport {
    pub fn title(&self) -> String {
        format!("{} Price Forecast", capitalize(&self.coin_id))
    }

    pub fn message(&self) -> String {
        format!(
            "Current Price: ${:.2} (as of {})\n\nForecasted Price: ${:.2}",
            self.current_price,
            self.as_of.format("%Y-%m-%d %H:%M:%S"),
            self.peak_forecast
        )
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Walks the coin list: history -> trend -> peak -> notification.
pub struct Monitor {
    coins: Vec<String>,
    window_days: u32,
    interval: Duration,
    fetcher: HistoricalFetcher,
    forecaster: Forecaster,
    notifier: Arc<dyn Notifier>,
    stats: Arc<MonitorStats>,
}

impl Monitor {
    pub fn new(
        config: &Config,
        fetcher: HistoricalFetcher,
        notifier: Arc<dyn Notifier>,
        stats: Arc<MonitorStats>,
    ) -> Self {
        Self {
            coins: config.coins.clone(),
            window_days: config.history.window_days,
            interval: config.monitor.interval(),
            fetcher,
            forecaster: Forecaster::new(config.forecast.clone()),
            notifier,
            stats,
        }
    }

    pub async fn run(self) {
        info!(
            "Starting forecast monitor for {} coins ({}-day window, {}-day horizon)",
            self.coins.len(),
            self.window_days,
            self.forecaster.horizon()
        );
        loop {
            self.run_round().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One sequential pass over every coin.
    pub async fn run_round(&self) -> Vec<CoinReport> {
        let mut reports = Vec::with_capacity(self.coins.len());
        for coin_id in &self.coins {
            match self.check_coin(coin_id).await {
                Some(report) => reports.push(report),
                None => self.stats.record_skip(),
            }
        }
        self.stats.record_round();
        reports
    }

    /// `None` when there was no history or nothing to forecast this round.
    pub async fn check_coin(&self, coin_id: &str) -> Option<CoinReport> {
        let series = self.fetcher.fetch_history(coin_id, self.window_days).await;
        let latest = match series.latest() {
            Some(latest) => *latest,
            None => {
                warn!("Failed to retrieve data for {}", coin_id);
                return None;
            }
        };
        debug!("Processed {} points for {}", series.len(), coin_id);

        let forecast = self.forecaster.forecast(&series, self.forecaster.horizon())?;
        debug!("Forecasted prices for {}: {:?}", coin_id, forecast.values);

        let Some(peak_forecast) = forecast.peak() else {
            warn!("Empty forecast for {}", coin_id);
            return None;
        };

        let report = CoinReport {
            coin_id: coin_id.to_string(),
            current_price: latest.price,
            as_of: latest.timestamp,
            peak_forecast,
            forecast,
        };

        match self.notifier.notify(&report.title(), &report.message()).await {
            Ok(()) => self.stats.record_notification(),
            Err(e) => warn!("Failed to send notification for {}: {}", coin_id, e),
        }
        Some(report)
    }
}
