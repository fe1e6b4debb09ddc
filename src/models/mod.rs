use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod market;

pub use market::{HistoricalSeries, PricePoint};

/// Coin id -> current USD price, freshly built every poll cycle.
pub type PriceSnapshot = BTreeMap<String, f64>;

/// Coin id -> signal. Always keyed exactly like the snapshot it came from.
pub type RecommendationMap = BTreeMap<String, Recommendation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
        };
        f.write_str(label)
    }
}

/// Body of the `update_data` event pushed to dashboard subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub prices: PriceSnapshot,
    pub recommendations: RecommendationMap,
}
