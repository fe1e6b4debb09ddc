use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    /// Builds a point from the upstream `[timestamp_ms, price]` pair.
    pub fn from_millis(timestamp_ms: i64, price: f64) -> Option<Self> {
        DateTime::from_timestamp_millis(timestamp_ms).map(|timestamp| Self { timestamp, price })
    }
}

/// Trailing price history for one coin, strictly ascending by timestamp.
///
/// An empty series is the "no data this cycle" sentinel and is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    coin_id: String,
    points: Vec<PricePoint>,
}

impl HistoricalSeries {
    pub fn empty(coin_id: &str) -> Self {
        Self {
            coin_id: coin_id.to_string(),
            points: Vec::new(),
        }
    }

    /// Keeps upstream order, dropping any point that does not advance the clock.
    pub fn from_points(coin_id: &str, points: Vec<PricePoint>) -> Self {
        let mut kept: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match kept.last() {
                Some(last) if point.timestamp <= last.timestamp => {
                    warn!(
                        "Dropping out-of-order point for {} at {} (previous {})",
                        coin_id, point.timestamp, last.timestamp
                    );
                }
                _ => kept.push(point),
            }
        }

        Self {
            coin_id: coin_id.to_string(),
            points: kept,
        }
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
