//! Price Feed
//!
//! In-memory map from ticker symbol to the last known market snapshot.
//!
//! - `preload` pulls the top of the market-cap ranking once
//! - `resolve_and_add` tracks a symbol outside that universe on demand
//! - `refresh` (driven by [`RefreshHandle`]) re-quotes every tracked symbol
//!   that has a catalog id
//!
//! Lookups never hit the network. Failures degrade to "no update"; the map
//! only ever grows.

mod refresh;
mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use refresh::RefreshHandle;
pub use snapshot::{normalize_symbol, TokenPriceSnapshot};

use crate::clients::{MarketCoin, MarketDataSource};
use crate::error::MarketDataError;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Feed tuning. Defaults cover the top 500 assets and re-quote every 15s.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Number of market-cap pages fetched by `preload`
    pub preload_pages: u32,
    /// Page size for `preload`
    pub per_page: u32,
    /// Period of the background refresh
    pub refresh_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            preload_pages: 2,
            per_page: 250,
            refresh_interval: Duration::from_secs(15),
        }
    }
}

/// Lifecycle of a feed. There is no error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Empty,
    Loading,
    Ready,
}

struct FeedState {
    /// SYMBOL -> snapshot
    prices: HashMap<String, TokenPriceSnapshot>,
    /// SYMBOL -> provider catalog id
    symbol_index: HashMap<String, String>,
    phase: FeedPhase,
}

impl FeedState {
    fn settle_phase(&mut self) {
        self.phase = if self.prices.is_empty() {
            FeedPhase::Empty
        } else {
            FeedPhase::Ready
        };
    }
}

/// Merge market pages in order. The first row seen for a symbol wins; later
/// rows with the same ticker (other assets reusing it) are dropped.
pub fn merge_market_pages(
    pages: &[Vec<MarketCoin>],
    now: DateTime<Utc>,
) -> (HashMap<String, TokenPriceSnapshot>, HashMap<String, String>) {
    let mut prices = HashMap::new();
    let mut index = HashMap::new();

    for coin in pages.iter().flatten() {
        let Some(snapshot) = TokenPriceSnapshot::from_market(coin, now) else {
            continue;
        };
        if prices.contains_key(&snapshot.symbol) {
            continue;
        }
        if !coin.id.is_empty() {
            index.insert(snapshot.symbol.clone(), coin.id.clone());
        }
        prices.insert(snapshot.symbol.clone(), snapshot);
    }

    (prices, index)
}

/// Shared handle to one feed. Clones see the same state.
#[derive(Clone)]
pub struct PriceFeed {
    source: Arc<dyn MarketDataSource>,
    state: Arc<RwLock<FeedState>>,
    closed: Arc<AtomicBool>,
    config: FeedConfig,
}

impl PriceFeed {
    pub fn new(source: Arc<dyn MarketDataSource>, config: FeedConfig) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(FeedState {
                prices: HashMap::new(),
                symbol_index: HashMap::new(),
                phase: FeedPhase::Empty,
            })),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn phase(&self) -> FeedPhase {
        self.state.read().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == FeedPhase::Loading
    }

    /// Snapshot for a symbol, case-insensitive. Never fetches.
    pub fn get_price(&self, symbol: &str) -> Option<TokenPriceSnapshot> {
        self.state.read().prices.get(&normalize_symbol(symbol)).cloned()
    }

    /// Copy of the whole map, for rendering lists.
    pub fn prices(&self) -> HashMap<String, TokenPriceSnapshot> {
        self.state.read().prices.clone()
    }

    /// Tracked symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.state.read().prices.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.state.read().prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().prices.is_empty()
    }

    /// Provider catalog id for a tracked symbol, if one was obtained.
    pub fn catalog_id(&self, symbol: &str) -> Option<String> {
        self.state
            .read()
            .symbol_index
            .get(&normalize_symbol(symbol))
            .cloned()
    }

    /// Mark the feed as torn down. In-flight work discards its results and
    /// the refresh loop exits at its next tick.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetch the configured market-cap pages concurrently and merge them in.
    ///
    /// All pages must succeed; on any failure the map is left as it was.
    /// Symbols already tracked keep their snapshot and catalog id. Not
    /// retried.
    pub async fn preload(&self) {
        self.state.write().phase = FeedPhase::Loading;

        let fetches = (1..=self.config.preload_pages)
            .map(|page| self.source.top_markets(page, self.config.per_page));
        let result = try_join_all(fetches).await;

        if self.is_closed() {
            debug!("Feed closed during preload, discarding result");
            self.state.write().settle_phase();
            return;
        }

        match result {
            Ok(pages) => {
                let (prices, mut index) = merge_market_pages(&pages, Utc::now());
                let mut state = self.state.write();
                let mut added = 0;
                for (symbol, snapshot) in prices {
                    // Resolved while the pages were in flight
                    if state.prices.contains_key(&symbol) {
                        continue;
                    }
                    if let Some(id) = index.remove(&symbol) {
                        state.symbol_index.insert(symbol.clone(), id);
                    }
                    state.prices.insert(symbol, snapshot);
                    added += 1;
                }
                state.settle_phase();
                info!(
                    "Preloaded {} symbols from {} ({} pages), {} tracked",
                    added,
                    self.source.provider_name(),
                    pages.len(),
                    state.prices.len()
                );
            }
            Err(e) => {
                error!(
                    "Failed to preload prices from {}: {:#}",
                    self.source.provider_name(),
                    e
                );
                self.state.write().settle_phase();
            }
        }
    }

    /// Re-quote every tracked symbol that has a catalog id in one request.
    ///
    /// Rows for untracked symbols are ignored, so the set never grows here.
    /// Failures are logged at debug level and otherwise ignored.
    pub async fn refresh(&self) {
        let ids: Vec<String> = {
            let state = self.state.read();
            let mut ids: Vec<String> = state
                .prices
                .keys()
                .filter_map(|symbol| state.symbol_index.get(symbol).cloned())
                .collect();
            ids.sort();
            ids
        };

        if ids.is_empty() {
            return;
        }

        let coins = match self.source.markets_by_ids(&ids).await {
            Ok(coins) => coins,
            Err(e) => {
                debug!("Price refresh failed: {:#}", e);
                return;
            }
        };

        if self.is_closed() {
            return;
        }

        let now = Utc::now();
        let mut state = self.state.write();
        let mut updated = 0;
        for coin in &coins {
            let symbol = normalize_symbol(&coin.symbol);
            if let Some(snapshot) = state.prices.get_mut(&symbol) {
                *snapshot = snapshot.refreshed_from(coin, now);
                updated += 1;
            }
        }

        debug!("Refreshed {}/{} symbols", updated, ids.len());
    }

    /// Track a symbol on demand.
    ///
    /// Returns the tracked symbol, or `None` if the input is blank, the
    /// provider knows no matching asset, or any request fails. Already
    /// tracked symbols return immediately without a request.
    pub async fn resolve_and_add(&self, symbol_input: &str) -> Option<String> {
        let symbol = normalize_symbol(symbol_input);
        if symbol.is_empty() {
            return None;
        }
        if self.state.read().prices.contains_key(&symbol) {
            return Some(symbol);
        }

        match self.resolve(&symbol).await {
            Ok((id, snapshot)) => {
                if self.is_closed() {
                    debug!("Feed closed while resolving {}, dropping update", symbol);
                    return None;
                }

                let resolved = snapshot.symbol.clone();
                let mut state = self.state.write();
                state.symbol_index.insert(resolved.clone(), id);
                state.prices.insert(resolved.clone(), snapshot);
                if state.phase == FeedPhase::Empty {
                    state.phase = FeedPhase::Ready;
                }

                info!("Now tracking {} (requested {})", resolved, symbol);
                Some(resolved)
            }
            Err(e) => {
                warn!("Failed to resolve symbol {}: {:#}", symbol, e);
                None
            }
        }
    }

    async fn resolve(&self, symbol: &str) -> Result<(String, TokenPriceSnapshot)> {
        let provider = self.source.provider_name().to_string();
        let hits = self.source.search(symbol).await?;

        let pick = hits
            .iter()
            .find(|coin| normalize_symbol(&coin.symbol) == symbol)
            .or_else(|| hits.first())
            .filter(|coin| !coin.id.is_empty())
            .ok_or_else(|| MarketDataError::EmptyResponse {
                provider: provider.clone(),
                what: format!("search {}", symbol),
            })?;

        let coins = self
            .source
            .markets_by_ids(std::slice::from_ref(&pick.id))
            .await?;
        let coin = coins.first().ok_or_else(|| MarketDataError::EmptyResponse {
            provider,
            what: format!("markets {}", pick.id),
        })?;

        let snapshot = TokenPriceSnapshot::from_market(coin, Utc::now())
            .ok_or_else(|| anyhow!("market row for {} has no symbol", pick.id))?;

        Ok((pick.id.clone(), snapshot))
    }
}
