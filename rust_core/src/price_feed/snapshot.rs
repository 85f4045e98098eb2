//! Token price snapshots

use crate::clients::MarketCoin;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time price and metadata for one ticker symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPriceSnapshot {
    /// Uppercase ticker, the key in the feed's mapping
    pub symbol: String,
    /// Price in USD
    pub price: f64,
    /// Trailing 24h change in percent
    pub change_24h: f64,
    pub market_cap: f64,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    /// When the response that produced this snapshot was applied
    pub updated_at: DateTime<Utc>,
}

/// Uppercase, whitespace-trimmed form of a ticker.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

impl TokenPriceSnapshot {
    /// Build a fresh snapshot from a market row.
    ///
    /// Returns `None` when the row has no usable symbol. Missing numbers
    /// default to zero and a missing name to the symbol.
    pub fn from_market(coin: &MarketCoin, now: DateTime<Utc>) -> Option<Self> {
        let symbol = normalize_symbol(&coin.symbol);
        if symbol.is_empty() {
            return None;
        }

        let name = non_empty(coin.name.as_ref()).unwrap_or_else(|| symbol.clone());

        Some(Self {
            symbol,
            price: coin.current_price.unwrap_or(0.0),
            change_24h: coin.price_change_percentage_24h.unwrap_or(0.0),
            market_cap: coin.market_cap.unwrap_or(0.0),
            name: Some(name),
            logo_url: non_empty(coin.image.as_ref()),
            updated_at: now,
        })
    }

    /// Newer snapshot for the same symbol from a refresh row.
    ///
    /// Fields the row leaves out keep their previous values.
    pub fn refreshed_from(&self, coin: &MarketCoin, now: DateTime<Utc>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            price: coin.current_price.unwrap_or(self.price),
            change_24h: coin.price_change_percentage_24h.unwrap_or(self.change_24h),
            market_cap: coin.market_cap.unwrap_or(self.market_cap),
            name: non_empty(coin.name.as_ref()).or_else(|| self.name.clone()),
            logo_url: non_empty(coin.image.as_ref()).or_else(|| self.logo_url.clone()),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(symbol: &str, price: Option<f64>) -> MarketCoin {
        MarketCoin {
            id: format!("{}-id", symbol),
            symbol: symbol.to_string(),
            name: Some("Test".to_string()),
            image: Some("https://img/test.png".to_string()),
            current_price: price,
            market_cap: Some(1_000.0),
            price_change_percentage_24h: Some(-3.5),
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" eth "), "ETH");
        assert_eq!(normalize_symbol("Btc"), "BTC");
        assert_eq!(normalize_symbol("   "), "");
    }

    #[test]
    fn test_from_market_uppercases_and_defaults() {
        let snap = TokenPriceSnapshot::from_market(&coin("sol", None), Utc::now()).unwrap();
        assert_eq!(snap.symbol, "SOL");
        assert_eq!(snap.price, 0.0);
        assert_eq!(snap.change_24h, -3.5);
        assert_eq!(snap.logo_url.as_deref(), Some("https://img/test.png"));
    }

    #[test]
    fn test_from_market_names_unnamed_rows_by_symbol() {
        let unnamed = MarketCoin {
            name: None,
            ..coin("pepe", Some(0.00001))
        };
        let snap = TokenPriceSnapshot::from_market(&unnamed, Utc::now()).unwrap();
        assert_eq!(snap.name.as_deref(), Some("PEPE"));

        let blank = MarketCoin {
            name: Some(String::new()),
            ..coin("pepe", Some(0.00001))
        };
        let snap = TokenPriceSnapshot::from_market(&blank, Utc::now()).unwrap();
        assert_eq!(snap.name.as_deref(), Some("PEPE"));
    }

    #[test]
    fn test_from_market_rejects_blank_symbol() {
        assert!(TokenPriceSnapshot::from_market(&coin("  ", Some(1.0)), Utc::now()).is_none());
    }

    #[test]
    fn test_refresh_keeps_missing_fields() {
        let t0 = Utc::now();
        let before = TokenPriceSnapshot::from_market(&coin("eth", Some(3000.0)), t0).unwrap();

        let partial = MarketCoin {
            id: "ethereum".to_string(),
            symbol: "eth".to_string(),
            current_price: Some(3100.0),
            ..Default::default()
        };
        let t1 = t0 + chrono::Duration::seconds(15);
        let after = before.refreshed_from(&partial, t1);

        assert_eq!(after.price, 3100.0);
        assert_eq!(after.change_24h, -3.5);
        assert_eq!(after.market_cap, 1_000.0);
        assert_eq!(after.name.as_deref(), Some("Test"));
        assert_eq!(after.updated_at, t1);
    }
}
