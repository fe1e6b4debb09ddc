use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::api::PriceSource;
use crate::config::{Config, PollConfig};
use crate::metrics::PollStats;
use crate::models::MarketUpdate;
use crate::strategies::Recommender;
use crate::web::publisher::{Publisher, UPDATE_EVENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Fetching,
    Waiting(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { subscribers: usize },
    PublishFailed,
    RateLimited { streak: u64 },
    Failed,
}

/// Fetch -> classify -> publish, forever.
///
/// Rate limiting is retried without a cap; the streak length is kept in
/// [`PollStats`] so a stuck feed shows up on `/health`.
pub struct PollLoop {
    coins: Vec<String>,
    source: Arc<dyn PriceSource>,
    recommender: Arc<dyn Recommender>,
    publisher: Arc<dyn Publisher>,
    config: PollConfig,
    stats: Arc<PollStats>,
    state: PollState,
}

impl PollLoop {
    pub fn new(
        config: &Config,
        source: Arc<dyn PriceSource>,
        recommender: Arc<dyn Recommender>,
        publisher: Arc<dyn Publisher>,
        stats: Arc<PollStats>,
    ) -> Self {
        Self {
            coins: config.coins.clone(),
            source,
            recommender,
            publisher,
            config: config.poll.clone(),
            stats,
            state: PollState::Fetching,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub async fn run(mut self) {
        info!(
            "Starting price feed for {} coins using {}",
            self.coins.len(),
            self.recommender.name()
        );
        loop {
            match self.state {
                PollState::Fetching => {
                    self.run_cycle().await;
                }
                PollState::Waiting(delay) => {
                    tokio::time::sleep(delay).await;
                    self.state = PollState::Fetching;
                }
            }
        }
    }

    /// One Fetching step. Leaves the loop in `Waiting` with the next delay.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.record_cycle();

        let (outcome, delay) = match self.source.fetch_prices(&self.coins).await {
            Ok(prices) => {
                self.stats.reset_rate_limit_streak();
                let recommendations = self.recommender.classify(&prices);
                let update = MarketUpdate {
                    prices,
                    recommendations,
                };
                (self.publish(update).await, self.config.interval())
            }
            Err(e) if e.is_rate_limited() => {
                let streak = self.stats.record_rate_limited();
                let backoff = self.config.rate_limit_backoff();
                warn!(
                    "Rate limit exceeded ({} in a row). Waiting {:?} before retrying...",
                    streak, backoff
                );
                let every = self.config.stuck_warning_every;
                if every > 0 && streak % every == 0 {
                    error!("Price feed has been rate limited {} times in a row", streak);
                }
                (CycleOutcome::RateLimited { streak }, backoff)
            }
            Err(e) => {
                self.stats.record_error();
                self.stats.reset_rate_limit_streak();
                error!("Error fetching cryptocurrency data: {}", e);
                (CycleOutcome::Failed, self.config.error_backoff())
            }
        };

        self.state = PollState::Waiting(delay);
        outcome
    }

    async fn publish(&self, update: MarketUpdate) -> CycleOutcome {
        debug!("Sending data to clients: {:?}", update);
        let payload = match serde_json::to_value(&update) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize market update: {}", e);
                return CycleOutcome::PublishFailed;
            }
        };

        let timeout = self.config.publish_timeout();
        match tokio::time::timeout(timeout, self.publisher.publish(UPDATE_EVENT, payload)).await {
            Ok(Ok(subscribers)) => {
                self.stats.record_publish();
                info!(
                    "Published prices for {} coins to {} subscribers",
                    update.prices.len(),
                    subscribers
                );
                CycleOutcome::Published { subscribers }
            }
            Ok(Err(e)) => {
                warn!("Failed to publish market update: {}", e);
                CycleOutcome::PublishFailed
            }
            Err(_) => {
                warn!("Publishing market update timed out after {:?}", timeout);
                CycleOutcome::PublishFailed
            }
        }
    }
}
