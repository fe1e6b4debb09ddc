use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{PricePoint, PriceSnapshot};

/// One entry of the `/simple/price` body: `{"bitcoin": {"usd": 65000.0}}`.
#[derive(Debug, Deserialize)]
pub struct SimplePriceEntry {
    #[serde(default)]
    pub usd: Option<f64>,
}

pub type SimplePriceResponse = HashMap<String, SimplePriceEntry>;

/// Every coin in the body is carried through; a missing `usd` field reads as 0.
pub fn into_snapshot(response: SimplePriceResponse) -> PriceSnapshot {
    response
        .into_iter()
        .map(|(coin, entry)| (coin, entry.usd.unwrap_or(0.0)))
        .collect()
}

/// Body of `/coins/{id}/market_chart/range`; only `prices` is used.
#[derive(Debug, Deserialize)]
pub struct MarketChartRange {
    pub prices: Vec<[f64; 2]>,
}

impl MarketChartRange {
    pub fn into_points(self) -> Vec<PricePoint> {
        self.prices
            .into_iter()
            .filter_map(|[timestamp_ms, price]| PricePoint::from_millis(timestamp_ms as i64, price))
            .collect()
    }
}
