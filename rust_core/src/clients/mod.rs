pub mod coingecko;
pub mod market_data;

// Re-export commonly used types
pub use coingecko::CoinGeckoClient;
pub use market_data::{MarketCoin, MarketDataSource, ProviderStatus, SearchCoin};
