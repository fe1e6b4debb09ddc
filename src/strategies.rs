use crate::config::ThresholdConfig;
use crate::models::{PriceSnapshot, Recommendation, RecommendationMap};

pub trait Recommender: Send + Sync {
    fn classify(&self, snapshot: &PriceSnapshot) -> RecommendationMap;
    fn name(&self) -> &'static str;
}

/// Static price bands: above `sell_above` sells, below `buy_below` buys.
///
/// The same bands apply to every coin regardless of its usual price range.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRecommender {
    thresholds: ThresholdConfig,
}

impl ThresholdRecommender {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn recommend(&self, price: f64) -> Recommendation {
        if price > self.thresholds.sell_above {
            Recommendation::Sell
        } else if price < self.thresholds.buy_below {
            Recommendation::Buy
        } else {
            Recommendation::Hold
        }
    }
}

impl Default for ThresholdRecommender {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl Recommender for ThresholdRecommender {
    fn classify(&self, snapshot: &PriceSnapshot) -> RecommendationMap {
        snapshot
            .iter()
            .map(|(coin, &price)| (coin.clone(), self.recommend(price)))
            .collect()
    }

    fn name(&self) -> &'static str {
        "Static Threshold"
    }
}
