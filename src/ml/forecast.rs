use log::{debug, error};
use ndarray::Array1;
use serde::Serialize;

use super::preprocessing::train_test_split;
use super::regression::LinearRegression;
use crate::config::ForecastConfig;
use crate::models::HistoricalSeries;

/// Predicted prices for the steps right after the last observed index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub values: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
    pub training_points: usize,
    /// R² on the held-out rows, when any were held out.
    pub test_r_squared: Option<f64>,
}

impl Forecast {
    pub fn peak(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Linear trend on position index -> price.
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn horizon(&self) -> usize {
        self.config.horizon_days
    }

    /// `None` for an empty series; otherwise `horizon` extrapolated prices.
    ///
    /// With the split enabled the line is fitted on the seeded training rows
    /// only. If that would leave fewer than two rows the whole series is used.
    pub fn forecast(&self, series: &HistoricalSeries, horizon: usize) -> Option<Forecast> {
        if series.is_empty() {
            return None;
        }

        let prices = series.prices();
        let n = prices.len();

        let (train, test) = if self.config.use_split {
            let split = train_test_split(n, self.config.test_fraction, self.config.seed);
            if split.train.len() >= 2 {
                (split.train, split.test)
            } else {
                ((0..n).collect(), Vec::new())
            }
        } else {
            ((0..n).collect(), Vec::new())
        };

        let x_train = Array1::from_iter(train.iter().map(|&i| i as f64));
        let y_train = Array1::from_iter(train.iter().map(|&i| prices[i]));

        let mut model = LinearRegression::new();
        if let Err(e) = model.fit(&x_train, &y_train) {
            error!("Failed to fit trend for {}: {}", series.coin_id(), e);
            return None;
        }

        let test_r_squared = if test.is_empty() {
            None
        } else {
            let x_test = Array1::from_iter(test.iter().map(|&i| i as f64));
            let y_test = Array1::from_iter(test.iter().map(|&i| prices[i]));
            model.r_squared(&x_test, &y_test).ok()
        };

        let future = Array1::from_iter((n..n + horizon).map(|i| i as f64));
        let values = match model.predict(&future) {
            Ok(values) => values.to_vec(),
            Err(e) => {
                error!("Failed to extrapolate trend for {}: {}", series.coin_id(), e);
                return None;
            }
        };

        let forecast = Forecast {
            values,
            slope: model.slope.unwrap_or_default(),
            intercept: model.intercept.unwrap_or_default(),
            training_points: train.len(),
            test_r_squared,
        };
        debug!(
            "Trend for {}: slope {:.6}, intercept {:.6}, trained on {}/{} points, test R² {:?}",
            series.coin_id(),
            forecast.slope,
            forecast.intercept,
            forecast.training_points,
            n,
            forecast.test_r_squared
        );
        Some(forecast)
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn series(prices: &[f64]) -> HistoricalSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::from_millis(1_700_000_000_000 + i as i64 * 3_600_000, p).unwrap())
            .collect();
        HistoricalSeries::from_points("bitcoin", points)
    }

    #[test]
    fn test_empty_series_is_absent() {
        let forecaster = Forecaster::default();
        assert!(forecaster.forecast(&HistoricalSeries::empty("bitcoin"), 7).is_none());
    }

    #[test]
    fn test_increasing_series_gives_non_decreasing_forecast() {
        let prices: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let forecast = Forecaster::default().forecast(&series(&prices), 7).unwrap();

        assert_eq!(forecast.len(), 7);
        assert!(forecast.values.windows(2).all(|w| w[1] >= w[0]));
        assert!((forecast.slope - 1.0).abs() < 1e-9);
        assert!((forecast.values[0] - 168.0).abs() < 1e-6);
        assert_eq!(forecast.training_points, 134);
        assert!(forecast.test_r_squared.unwrap() > 0.999);
    }

    #[test]
    fn test_forecast_is_reproducible() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let forecaster = Forecaster::default();
        let first = forecaster.forecast(&series(&prices), 7).unwrap();
        let second = forecaster.forecast(&series(&prices), 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_full_fit_without_split() {
        let forecaster = Forecaster::new(ForecastConfig {
            use_split: false,
            ..ForecastConfig::default()
        });
        let forecast = forecaster.forecast(&series(&[10.0, 8.0, 6.0]), 2).unwrap();

        assert_eq!(forecast.training_points, 3);
        assert!(forecast.test_r_squared.is_none());
        assert!((forecast.values[0] - 4.0).abs() < 1e-9);
        assert!((forecast.values[1] - 2.0).abs() < 1e-9);
        assert!((forecast.peak().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_series_falls_back_to_full_fit() {
        let forecast = Forecaster::default().forecast(&series(&[25.0]), 3).unwrap();
        assert_eq!(forecast.values, vec![25.0, 25.0, 25.0]);

        let forecast = Forecaster::default().forecast(&series(&[1.0, 2.0]), 1).unwrap();
        assert_eq!(forecast.training_points, 2);
        assert!((forecast.values[0] - 3.0).abs() < 1e-9);
    }
}
