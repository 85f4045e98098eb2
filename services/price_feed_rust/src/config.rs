//! Configuration for price_feed_rust

use anyhow::{anyhow, Result};
use shiftmind_core::clients::coingecko::DEFAULT_BASE_URL;
use shiftmind_core::FeedConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Upstream
    pub coingecko_base_url: String,
    pub coingecko_timeout: Duration,

    // Feed
    pub preload_pages: u32,
    pub per_page: u32,
    pub refresh_interval: Duration,

    // Watchlist
    pub watchlist_path: PathBuf,
    pub watchlist_log_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let preload_pages = parse_u32("PRICE_FEED_PAGES", 2)?;
        let per_page = parse_u32("PRICE_FEED_PER_PAGE", 250)?;
        let refresh_secs = parse_u64("PRICE_REFRESH_INTERVAL_SECS", 15)?;
        let timeout_secs = parse_u64("COINGECKO_TIMEOUT_SECS", 30)?;
        let watchlist_log_secs = parse_u64("WATCHLIST_LOG_INTERVAL_SECS", 30)?;

        if preload_pages == 0 {
            return Err(anyhow!("PRICE_FEED_PAGES must be > 0"));
        }
        if per_page == 0 {
            return Err(anyhow!("PRICE_FEED_PER_PAGE must be > 0"));
        }
        if refresh_secs == 0 || timeout_secs == 0 || watchlist_log_secs == 0 {
            return Err(anyhow!("Intervals and timeouts must be > 0 seconds"));
        }

        Ok(Self {
            coingecko_base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            coingecko_timeout: Duration::from_secs(timeout_secs),

            preload_pages,
            per_page,
            refresh_interval: Duration::from_secs(refresh_secs),

            watchlist_path: env::var("WATCHLIST_PATH")
                .unwrap_or_else(|_| "shiftmind_watchlist.json".to_string())
                .into(),
            watchlist_log_interval: Duration::from_secs(watchlist_log_secs),
        })
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            preload_pages: self.preload_pages,
            per_page: self.per_page,
            refresh_interval: self.refresh_interval,
        }
    }
}

/// Parse environment variable as u32 with default fallback
fn parse_u32(var_name: &str, default: u32) -> Result<u32> {
    match env::var(var_name) {
        Ok(val) => val.parse().map_err(|_| anyhow!("{} must be a valid u32", var_name)),
        Err(_) => Ok(default),
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val.parse().map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}
