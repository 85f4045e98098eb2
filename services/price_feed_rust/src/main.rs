mod config;

use anyhow::{Context, Result};
use config::Config;
use dotenv::dotenv;
use shiftmind_core::{CoinGeckoClient, PriceFeed, Watchlist};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting price_feed_rust...");

    let config = Config::from_env().context("Invalid configuration")?;

    let client = Arc::new(CoinGeckoClient::with_base_url(
        &config.coingecko_base_url,
        config.coingecko_timeout,
    ));
    let feed = PriceFeed::new(client, config.feed_config());

    feed.preload().await;
    info!("Feed ready with {} symbols", feed.len());

    let watchlist = Watchlist::load(&config.watchlist_path);
    let missing = watchlist.track_all(&feed).await;
    if !missing.is_empty() {
        warn!("Watchlist symbols without market data: {:?}", missing);
    }
    if let Err(e) = watchlist.save(&config.watchlist_path) {
        warn!(
            "Failed to save watchlist to {}: {}",
            config.watchlist_path.display(),
            e
        );
    }

    let refresh = feed.start_refresh();

    let mut report = interval(config.watchlist_log_interval);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = report.tick() => {
                for row in watchlist.rows(&feed) {
                    info!("{}", row);
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down price feed");
    feed.shutdown();
    refresh.stop();

    Ok(())
}
