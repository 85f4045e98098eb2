//! ShiftMind Core - market prices for the portfolio dashboard.
//!
//! This crate provides:
//! - A CoinGecko market-data client behind the `MarketDataSource` trait
//! - `PriceFeed`: symbol → snapshot cache with preload, on-demand resolution
//!   and periodic refresh
//! - Watchlist rendering and persistence
//! - The scripted chat assistant
//! - Portfolio valuation, risk level and simulated swaps

pub mod assistant;
pub mod clients;
pub mod error;
pub mod portfolio;
pub mod price_feed;
pub mod watchlist;

pub use clients::{CoinGeckoClient, MarketDataSource, ProviderStatus};
pub use error::MarketDataError;
pub use price_feed::{FeedConfig, FeedPhase, PriceFeed, RefreshHandle, TokenPriceSnapshot};
pub use watchlist::Watchlist;
