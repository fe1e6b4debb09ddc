//! Ordinary least squares on a single feature.

use ndarray::Array1;

use crate::error::{Error, Result};

const VARIANCE_EPSILON: f64 = 1e-12;

/// `y = intercept + slope * x`, fitted in closed form.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solves `slope = Sxy / Sxx`, `intercept = mean(y) - slope * mean(x)`.
    ///
    /// A feature with no spread yields a flat line through `mean(y)`.
    pub fn fit(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        if x.len() != y.len() {
            return Err(Error::InvalidInput(format!(
                "dimension mismatch: {} features, {} targets",
                x.len(),
                y.len()
            )));
        }
        let (x_mean, y_mean) = match (x.mean(), y.mean()) {
            (Some(xm), Some(ym)) => (xm, ym),
            _ => return Err(Error::InvalidInput("cannot fit on an empty sample".into())),
        };

        let dx = x.mapv(|v| v - x_mean);
        let dy = y.mapv(|v| v - y_mean);
        let sxx = dx.dot(&dx);
        let sxy = dx.dot(&dy);

        let slope = if sxx.abs() < VARIANCE_EPSILON { 0.0 } else { sxy / sxx };
        self.slope = Some(slope);
        self.intercept = Some(y_mean - slope * x_mean);
        Ok(())
    }

    pub fn predict(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        match (self.slope, self.intercept) {
            (Some(slope), Some(intercept)) => Ok(x.mapv(|v| intercept + slope * v)),
            _ => Err(Error::InvalidInput("model has not been fitted yet".into())),
        }
    }

    /// Coefficient of determination on `(x, y)`.
    pub fn r_squared(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        let y_mean = y
            .mean()
            .ok_or_else(|| Error::InvalidInput("cannot score an empty sample".into()))?;

        let ss_res: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(&yi, &pi)| (yi - pi).powi(2))
            .sum();
        let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();

        if ss_tot < VARIANCE_EPSILON {
            return Ok(if ss_res < VARIANCE_EPSILON { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}
