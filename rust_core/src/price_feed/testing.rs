//! In-memory market-data source for unit tests

use super::{FeedConfig, PriceFeed};
use crate::clients::{MarketCoin, MarketDataSource, ProviderStatus, SearchCoin};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn market(id: &str, symbol: &str, price: f64, change: f64) -> MarketCoin {
    MarketCoin {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: Some(symbol.to_uppercase()),
        image: None,
        current_price: Some(price),
        market_cap: Some(price * 1_000.0),
        price_change_percentage_24h: Some(change),
    }
}

pub(crate) fn search_hit(id: &str, symbol: &str) -> SearchCoin {
    SearchCoin {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: None,
        market_cap_rank: None,
    }
}

#[derive(Default)]
struct Inner {
    pages: HashMap<u32, Vec<MarketCoin>>,
    failing_pages: HashSet<u32>,
    markets: HashMap<String, MarketCoin>,
    refresh: Option<Vec<MarketCoin>>,
    fail_refresh: bool,
    searches: HashMap<String, Vec<SearchCoin>>,
    page_delays: HashMap<u32, Duration>,
    ids_delay: Option<Duration>,
    calls: usize,
    ids_requests: Vec<Vec<String>>,
    ids_in_flight: usize,
    max_ids_in_flight: usize,
}

/// Scripted source; every call is counted.
#[derive(Default)]
pub(crate) struct FakeSource {
    inner: Mutex<Inner>,
}

impl FakeSource {
    pub fn set_page(&self, page: u32, coins: Vec<MarketCoin>) {
        self.inner.lock().pages.insert(page, coins);
    }

    pub fn fail_page(&self, page: u32) {
        self.inner.lock().failing_pages.insert(page);
    }

    /// Hold `top_markets` for `page` before answering
    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.inner.lock().page_delays.insert(page, delay);
    }

    /// Hold every `markets_by_ids` call started from now on
    pub fn delay_ids(&self, delay: Option<Duration>) {
        self.inner.lock().ids_delay = delay;
    }

    /// Row served by `markets_by_ids` for its id
    pub fn set_market(&self, coin: MarketCoin) {
        self.inner.lock().markets.insert(coin.id.clone(), coin);
    }

    /// Fixed `markets_by_ids` response, regardless of the ids asked for
    pub fn set_refresh(&self, coins: Vec<MarketCoin>) {
        self.inner.lock().refresh = Some(coins);
    }

    pub fn fail_refresh(&self, fail: bool) {
        self.inner.lock().fail_refresh = fail;
    }

    pub fn set_search(&self, query: &str, hits: Vec<SearchCoin>) {
        self.inner.lock().searches.insert(query.to_string(), hits);
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls
    }

    pub fn ids_request_count(&self) -> usize {
        self.inner.lock().ids_requests.len()
    }

    pub fn last_ids_request(&self) -> Option<Vec<String>> {
        self.inner.lock().ids_requests.last().cloned()
    }

    /// Most `markets_by_ids` calls ever in flight at once
    pub fn max_ids_in_flight(&self) -> usize {
        self.inner.lock().max_ids_in_flight
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    fn provider_name(&self) -> &str {
        "Fake"
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Healthy
    }

    async fn top_markets(&self, page: u32, _per_page: u32) -> Result<Vec<MarketCoin>> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls += 1;
            inner.page_delays.get(&page).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock();
        if inner.failing_pages.contains(&page) {
            return Err(anyhow!("page {} unavailable", page));
        }
        Ok(inner.pages.get(&page).cloned().unwrap_or_default())
    }

    async fn markets_by_ids(&self, ids: &[String]) -> Result<Vec<MarketCoin>> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls += 1;
            inner.ids_requests.push(ids.to_vec());
            inner.ids_in_flight += 1;
            inner.max_ids_in_flight = inner.max_ids_in_flight.max(inner.ids_in_flight);
            inner.ids_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        inner.ids_in_flight -= 1;
        if inner.fail_refresh {
            return Err(anyhow!("markets unavailable"));
        }
        if let Some(coins) = &inner.refresh {
            return Ok(coins.clone());
        }
        Ok(ids
            .iter()
            .filter_map(|id| inner.markets.get(id).cloned())
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCoin>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(inner.searches.get(query).cloned().unwrap_or_default())
    }
}

/// Feed preloaded from a single page of `coins`.
pub(crate) async fn ready_feed(source: &Arc<FakeSource>, coins: Vec<MarketCoin>) -> PriceFeed {
    source.set_page(1, coins);
    let feed = PriceFeed::new(
        source.clone(),
        FeedConfig {
            preload_pages: 1,
            ..FeedConfig::default()
        },
    );
    feed.preload().await;
    feed
}
