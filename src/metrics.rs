use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub const POLL_CYCLES: &str = "poll_cycles_total";
pub const POLL_PUBLISHES: &str = "poll_publishes_total";
pub const POLL_RATE_LIMITED: &str = "poll_rate_limited_total";
pub const POLL_CONSECUTIVE_RATE_LIMITED: &str = "poll_consecutive_rate_limited";
pub const POLL_ERRORS: &str = "poll_errors_total";
pub const MONITOR_NOTIFICATIONS: &str = "monitor_notifications_total";
pub const MONITOR_SKIPPED: &str = "monitor_skipped_coins_total";

/// Counters for the price poll loop, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct PollStats {
    cycles: AtomicU64,
    publishes: AtomicU64,
    rate_limited: AtomicU64,
    consecutive_rate_limited: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollStatsSnapshot {
    pub cycles: u64,
    pub publishes: u64,
    pub rate_limited: u64,
    pub consecutive_rate_limited: u64,
    pub errors: u64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!(POLL_CYCLES);
    }

    pub fn record_publish(&self) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!(POLL_PUBLISHES);
    }

    /// Returns the number of rate-limit hits in a row, including this one.
    pub fn record_rate_limited(&self) -> u64 {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
        let streak = self.consecutive_rate_limited.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::increment_counter!(POLL_RATE_LIMITED);
        metrics::gauge!(POLL_CONSECUTIVE_RATE_LIMITED, streak as f64);
        streak
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!(POLL_ERRORS);
    }

    pub fn reset_rate_limit_streak(&self) {
        self.consecutive_rate_limited.store(0, Ordering::Relaxed);
        metrics::gauge!(POLL_CONSECUTIVE_RATE_LIMITED, 0.0);
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            consecutive_rate_limited: self.consecutive_rate_limited.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct MonitorStats {
    rounds: AtomicU64,
    notifications: AtomicU64,
    skipped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStatsSnapshot {
    pub rounds: u64,
    pub notifications: u64,
    pub skipped: u64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!(MONITOR_NOTIFICATIONS);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!(MONITOR_SKIPPED);
    }

    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
