use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use coin_forecast::api::CoinGeckoClient;
use coin_forecast::cli::Cli;
use coin_forecast::config::Config;
use coin_forecast::metrics::{MonitorStats, PollStats};
use coin_forecast::monitoring::build_notifier;
use coin_forecast::services::{task_exit, HistoricalFetcher, Monitor, PollLoop};
use coin_forecast::strategies::ThresholdRecommender;
use coin_forecast::web::{AppState, BroadcastPublisher, WebServer};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load configuration from {:?}: {}", path, e))?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(&default_path)?
            } else {
                info!("No configuration file found, using built-in defaults");
                Config::default()
            }
        }
    };
    Ok(config.apply_env())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    coin_forecast::logging::init(cli.debug, cli.log_file.as_deref())?;

    info!("Starting coin forecast service...");
    let config = Arc::new(load_config(cli.config)?);
    info!("Tracking {} coins", config.coins.len());

    let client = Arc::new(CoinGeckoClient::new(&config.api, config.history.clone())?);
    let publisher = BroadcastPublisher::new();
    let poll_stats = Arc::new(PollStats::new());
    let monitor_stats = Arc::new(MonitorStats::new());

    let poll_loop = PollLoop::new(
        &config,
        client.clone(),
        Arc::new(ThresholdRecommender::new(config.thresholds)),
        Arc::new(publisher.clone()),
        poll_stats.clone(),
    );
    let price_feed = tokio::spawn(poll_loop.run());

    let mut monitor_task = if config.monitor.enabled && !cli.no_monitor {
        let monitor = Monitor::new(
            &config,
            HistoricalFetcher::new(client.clone(), config.history.clone()),
            build_notifier(&config.notifications),
            monitor_stats.clone(),
        );
        Some(tokio::spawn(monitor.run()))
    } else {
        warn!("Forecast monitor disabled");
        None
    };

    let server = WebServer::new(Arc::new(AppState {
        publisher,
        poll_stats,
        monitor_stats,
    }));

    tokio::select! {
        result = server.start(&config.web.host, config.web.port) => {
            if let Err(e) = result {
                error!("Web server error: {}", e);
                return Err(e.into());
            }
        }
        result = price_feed => {
            error!("Price feed task exited: {:?}", result);
        }
        result = task_exit(&mut monitor_task) => {
            error!("Forecast monitor task exited: {:?}", result);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    if let Some(task) = monitor_task {
        task.abort();
    }
    Ok(())
}
