//! CoinGecko API Client
//!
//! Public market-data endpoints used by the price feed:
//! - `/coins/markets` ranked by market cap (preload)
//! - `/coins/markets?ids=` for a batch of catalog ids (refresh, resolution)
//! - `/search` to turn a ticker guess into a catalog id

use super::market_data::{MarketCoin, MarketDataSource, ProviderStatus, SearchCoin};
use crate::error::MarketDataError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER: &str = "CoinGecko";

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    status: RwLock<ProviderStatus>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

impl CoinGeckoClient {
    /// Create a client against the public API with a 30 second timeout
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(30))
    }

    /// Create a client against a custom base URL (proxies, tests)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("ShiftMind/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            status: RwLock::new(ProviderStatus::Healthy),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let result = match self.send(&url, query).await {
            Ok(response) => response
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse CoinGecko response from {}", path)),
            Err(e) => Err(e),
        };
        self.record(&result);
        result
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to fetch from CoinGecko")?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response)
    }

    fn record<T>(&self, result: &Result<T>) {
        let next = match result {
            Ok(_) => ProviderStatus::Healthy,
            Err(e) => match e.downcast_ref::<MarketDataError>() {
                Some(err) if err.is_rate_limited() => ProviderStatus::RateLimited,
                _ => ProviderStatus::Error,
            },
        };
        *self.status.write() = next;
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn status(&self) -> ProviderStatus {
        *self.status.read()
    }

    async fn top_markets(&self, page: u32, per_page: u32) -> Result<Vec<MarketCoin>> {
        debug!("Fetching market page {} ({} per page) from CoinGecko", page, per_page);

        self.get_json(
            "/coins/markets",
            &[
                ("vs_currency", "usd".to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("price_change_percentage", "24h".to_string()),
            ],
        )
        .await
    }

    async fn markets_by_ids(&self, ids: &[String]) -> Result<Vec<MarketCoin>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Fetching markets for {} ids from CoinGecko", ids.len());

        self.get_json(
            "/coins/markets",
            &[
                ("vs_currency", "usd".to_string()),
                ("ids", ids.join(",")),
                ("price_change_percentage", "24h".to_string()),
            ],
        )
        .await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCoin>> {
        debug!("Searching CoinGecko catalog for {:?}", query);

        let response: SearchResponse = self
            .get_json("/search", &[("query", query.to_string())])
            .await?;

        Ok(response.coins)
    }
}
