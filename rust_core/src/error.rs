//! Error types for upstream market-data calls.
//!
//! Clients return `anyhow::Result`; the variants here are attached to those
//! errors so callers can downcast and tell rate limiting apart from other
//! API failures.

use thiserror::Error;

/// Classified failure from a market-data provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// HTTP 429 from the provider.
    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    /// Any other non-success HTTP status.
    #[error("{provider} API error: {status} - {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    /// The provider answered successfully but returned nothing usable.
    #[error("empty response from {provider} for {what}")]
    EmptyResponse { provider: String, what: String },
}

impl MarketDataError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_classification() {
        let err = MarketDataError::RateLimited {
            provider: "CoinGecko".to_string(),
        };
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "rate limited by CoinGecko");
    }

    #[test]
    fn test_api_error_downcasts_through_anyhow() {
        let err: anyhow::Error = MarketDataError::Api {
            provider: "CoinGecko".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
        .into();

        let inner = err.downcast_ref::<MarketDataError>().unwrap();
        assert!(!inner.is_rate_limited());
        assert!(err.to_string().contains("500"));
    }
}
