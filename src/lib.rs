pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod monitoring;
pub mod services;
pub mod strategies;
pub mod web;

pub use error::{Error, Result};
