//! Market Data Source Trait
//!
//! Defines the interface the price feed uses to reach a market-data provider.
//! `CoinGeckoClient` is the production implementation; tests plug in fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One row of a `/coins/markets` response.
///
/// Every numeric field is optional because the provider sends `null` for
/// thinly traded assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketCoin {
    /// Provider catalog id (e.g., "bitcoin")
    pub id: String,
    /// Ticker as the provider spells it (usually lowercase)
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Logo URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

/// One hit from a catalog text search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

/// Provider health/availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderStatus {
    /// Last request succeeded
    #[default]
    Healthy,
    /// Provider answered 429
    RateLimited,
    /// Provider returned an error or could not be reached
    Error,
}

/// Common trait for market-data providers
///
/// Implementations must be Send + Sync so a single instance can be shared by
/// the preload, the refresh task and on-demand resolution.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Display name used in logs (e.g., "CoinGecko")
    fn provider_name(&self) -> &str;

    /// Outcome of the most recent request
    fn status(&self) -> ProviderStatus;

    /// One page of the market universe ordered by market cap, descending.
    ///
    /// `page` is 1-based.
    async fn top_markets(&self, page: u32, per_page: u32) -> Result<Vec<MarketCoin>>;

    /// Market rows for the given catalog ids. Unknown ids are omitted from
    /// the result rather than reported as errors.
    async fn markets_by_ids(&self, ids: &[String]) -> Result<Vec<MarketCoin>>;

    /// Free-text catalog search, in provider relevance order.
    async fn search(&self, query: &str) -> Result<Vec<SearchCoin>>;
}
