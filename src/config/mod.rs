use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_COINS: [&str; 13] = [
    "bitcoin",
    "ethereum",
    "cardano",
    "litecoin",
    "ripple",
    "bitcoin-cash",
    "binancecoin",
    "tron",
    "eos",
    "dogecoin",
    "polkadot",
    "stellar",
    "chainlink",
];

const API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// Upper bound on the trailing history window (ten years).
pub const MAX_WINDOW_DAYS: u32 = 3650;

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

fn check_secs(name: &str, value: f64, allow_zero: bool) -> Result<()> {
    if !value.is_finite() || Duration::try_from_secs_f64(value).is_err() {
        return Err(Error::Config(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, value
        )));
    }
    if !allow_zero && value == 0.0 {
        return Err(Error::Config(format!("{} must be positive", name)));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub coins: Vec<String>,
    pub thresholds: ThresholdConfig,
    pub poll: PollConfig,
    pub history: HistoryConfig,
    pub forecast: ForecastConfig,
    pub monitor: MonitorConfig,
    pub notifications: NotificationConfig,
    pub web: WebConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: f64,
}

/// Price bounds shared by every coin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    pub sell_above: f64,
    pub buy_below: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: f64,
    pub rate_limit_backoff_secs: f64,
    pub error_backoff_secs: f64,
    pub publish_timeout_secs: f64,
    /// Warn every time this many rate-limit retries happen back to back.
    pub stuck_warning_every: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub window_days: u32,
    pub max_retries: u32,
    pub backoff_factor_secs: f64,
    pub retry_statuses: Vec<u16>,
    pub coarse_retry_delay_secs: f64,
    pub coarse_retries: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon_days: usize,
    pub use_split: bool,
    pub test_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub interval_secs: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationBackend {
    Desktop,
    Log,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub backend: NotificationBackend,
    pub display_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            coins: DEFAULT_COINS.iter().map(|c| c.to_string()).collect(),
            thresholds: ThresholdConfig::default(),
            poll: PollConfig::default(),
            history: HistoryConfig::default(),
            forecast: ForecastConfig::default(),
            monitor: MonitorConfig::default(),
            notifications: NotificationConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            request_timeout_secs: 30.0,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            sell_above: 5000.0,
            buy_below: 2000.0,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            rate_limit_backoff_secs: 60.0,
            error_backoff_secs: 60.0,
            publish_timeout_secs: 2.0,
            stuck_warning_every: 10,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        secs(self.interval_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        secs(self.rate_limit_backoff_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        secs(self.error_backoff_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        secs(self.publish_timeout_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            max_retries: 5,
            backoff_factor_secs: 1.0,
            retry_statuses: vec![429, 500, 502, 503, 504],
            coarse_retry_delay_secs: 60.0,
            coarse_retries: 1,
        }
    }
}

impl HistoryConfig {
    /// Delay before transport retry number `retry` (1-based): `factor * 2^(retry-1)`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        secs(self.backoff_factor_secs * f64::from(1u32 << exponent))
    }

    pub fn coarse_retry_delay(&self) -> Duration {
        secs(self.coarse_retry_delay_secs)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            use_split: true,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5.0,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        secs(self.interval_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backend: NotificationBackend::Desktop,
            display_timeout_secs: 10,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides the API key from the environment when it is set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = Some(key);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.coins.is_empty() {
            return Err(Error::Config("coin list must not be empty".into()));
        }
        if self.coins.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config("coin identifiers must not be blank".into()));
        }
        if self.thresholds.buy_below > self.thresholds.sell_above {
            return Err(Error::Config(format!(
                "buy_below ({}) must not exceed sell_above ({})",
                self.thresholds.buy_below, self.thresholds.sell_above
            )));
        }
        if self.history.window_days == 0 || self.history.window_days > MAX_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "history.window_days must be in 1..={}, got {}",
                MAX_WINDOW_DAYS, self.history.window_days
            )));
        }
        if self.forecast.horizon_days == 0 {
            return Err(Error::Config("forecast.horizon_days must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.forecast.test_fraction) {
            return Err(Error::Config(format!(
                "forecast.test_fraction must be in [0, 1), got {}",
                self.forecast.test_fraction
            )));
        }

        check_secs("api.request_timeout_secs", self.api.request_timeout_secs, false)?;
        check_secs("poll.interval_secs", self.poll.interval_secs, true)?;
        check_secs("poll.rate_limit_backoff_secs", self.poll.rate_limit_backoff_secs, false)?;
        check_secs("poll.error_backoff_secs", self.poll.error_backoff_secs, false)?;
        check_secs("poll.publish_timeout_secs", self.poll.publish_timeout_secs, false)?;
        check_secs("history.backoff_factor_secs", self.history.backoff_factor_secs, true)?;
        check_secs("history.coarse_retry_delay_secs", self.history.coarse_retry_delay_secs, true)?;
        check_secs("monitor.interval_secs", self.monitor.interval_secs, true)?;
        Ok(())
    }
}
