mod forecast;
mod preprocessing;
mod regression;

pub use forecast::{Forecast, Forecaster};
pub use preprocessing::{train_test_split, TrainTestSplit};
pub use regression::LinearRegression;
