//! Watchlist of ticker symbols.
//!
//! This module provides:
//! - An ordered, deduplicated list of uppercase symbols
//! - Price rows rendered from a `PriceFeed`
//! - JSON persistence

use crate::price_feed::{normalize_symbol, PriceFeed};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_SYMBOLS: [&str; 3] = ["BTC", "ETH", "MATIC"];

/// One rendered watchlist line. Missing prices render as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRow {
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    /// False when the feed has no snapshot for the symbol
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Default for Watchlist {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Watchlist {
    /// Create an empty watchlist.
    pub fn empty() -> Self {
        Self { symbols: Vec::new() }
    }

    /// Load from a JSON array of symbols. A missing or unreadable file gives
    /// the default list.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<Vec<String>>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(symbols) => {
                let mut list = Self::empty();
                for symbol in symbols {
                    list.add(&symbol);
                }
                list
            }
            Err(e) => {
                warn!("Ignoring unreadable watchlist {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save as a JSON array of symbols.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(&self.symbols)?;
        fs::write(path, content)
    }

    /// Add a symbol. Returns false for blank input or a duplicate.
    pub fn add(&mut self, symbol: &str) -> bool {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() || self.symbols.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// Remove a symbol. Returns false if it was not listed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let symbol = normalize_symbol(symbol);
        let before = self.symbols.len();
        self.symbols.retain(|s| *s != symbol);
        self.symbols.len() != before
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Ask the feed to track every listed symbol. Returns the symbols that
    /// could not be resolved.
    pub async fn track_all(&self, feed: &PriceFeed) -> Vec<String> {
        let mut missing = Vec::new();
        for symbol in &self.symbols {
            if feed.resolve_and_add(symbol).await.is_none() {
                missing.push(symbol.clone());
            }
        }
        missing
    }

    /// Current rows in list order.
    pub fn rows(&self, feed: &PriceFeed) -> Vec<WatchlistRow> {
        self.symbols
            .iter()
            .map(|symbol| match feed.get_price(symbol) {
                Some(snapshot) => WatchlistRow {
                    symbol: symbol.clone(),
                    price: snapshot.price,
                    change_24h: snapshot.change_24h,
                    quoted: true,
                },
                None => WatchlistRow {
                    symbol: symbol.clone(),
                    price: 0.0,
                    change_24h: 0.0,
                    quoted: false,
                },
            })
            .collect()
    }
}

impl std::fmt::Display for WatchlistRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.change_24h >= 0.0 { "+" } else { "-" };
        write!(
            f,
            "{:<8} ${:>12.2}  24h: {}{:.2}%",
            self.symbol,
            self.price,
            sign,
            self.change_24h.abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_feed::testing::{market, ready_feed, search_hit, FakeSource};
    use std::sync::Arc;

    #[test]
    fn test_default_symbols() {
        let list = Watchlist::default();
        assert_eq!(list.symbols(), &["BTC", "ETH", "MATIC"]);
    }

    #[test]
    fn test_add_normalizes_and_dedupes() {
        let mut list = Watchlist::empty();
        assert!(list.add(" sol "));
        assert!(!list.add("SOL"));
        assert!(!list.add("   "));
        assert_eq!(list.symbols(), &["SOL"]);
    }

    #[test]
    fn test_remove() {
        let mut list = Watchlist::default();
        assert!(list.remove("eth"));
        assert!(!list.remove("eth"));
        assert_eq!(list.symbols(), &["BTC", "MATIC"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");

        let mut list = Watchlist::empty();
        list.add("sol");
        list.add("doge");
        list.save(&path).unwrap();

        assert_eq!(Watchlist::load(&path), list);
    }

    #[test]
    fn test_load_missing_or_invalid_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(Watchlist::load(&missing), Watchlist::default());

        let invalid = dir.path().join("bad.json");
        fs::write(&invalid, "{not json").unwrap();
        assert_eq!(Watchlist::load(&invalid), Watchlist::default());
    }

    #[tokio::test]
    async fn test_rows_render_missing_as_zero() {
        let source = Arc::new(FakeSource::default());
        let feed = ready_feed(&source, vec![market("bitcoin", "btc", 65000.0, 2.1)]).await;
        let list = Watchlist::default();

        let rows = list.rows(&feed);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].price, 65000.0);
        assert!(rows[0].quoted);
        assert_eq!(rows[2].symbol, "MATIC");
        assert_eq!(rows[2].price, 0.0);
        assert!(!rows[2].quoted);
    }

    #[tokio::test]
    async fn test_track_all_reports_unresolved() {
        let source = Arc::new(FakeSource::default());
        let feed = ready_feed(&source, vec![market("bitcoin", "btc", 65000.0, 2.1)]).await;
        source.set_search("ETH", vec![search_hit("ethereum", "eth")]);
        source.set_market(market("ethereum", "eth", 3200.0, -1.4));

        let missing = Watchlist::default().track_all(&feed).await;

        assert_eq!(missing, vec!["MATIC".to_string()]);
        assert!(feed.get_price("ETH").is_some());
    }

    #[test]
    fn test_row_display() {
        let row = WatchlistRow {
            symbol: "ETH".to_string(),
            price: 3200.0,
            change_24h: -1.4,
            quoted: true,
        };
        let text = row.to_string();
        assert!(text.contains("3200.00"));
        assert!(text.contains("-1.40%"));
    }
}
