//! Errors raised while fetching, caching and decoding market data.

use thiserror::Error;

/// Result alias used across the data crate.
pub type Result<T> = std::result::Result<T, DataError>;

/// Everything that can go wrong between a request and a decoded series.
#[derive(Debug, Error)]
pub enum DataError {
    /// Session handshake (cookie or crumb) failed
    #[error("Yahoo Finance session error: {0}")]
    YahooApi(String),

    /// Unexpected HTTP status from the provider
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned
        status: u16,
        /// Requested URL (without credentials)
        url: String,
    },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response cache database failure
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A body or value did not have the expected shape
    #[error("Could not parse provider data: {0}")]
    Parse(String),

    /// Range with start after end
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// The provider has nothing for the symbol
    #[error("No data for {symbol}: {reason}")]
    MissingData {
        /// Symbol that was queried
        symbol: String,
        /// What was missing
        reason: String,
    },

    /// JSON decoding failure
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Empty or malformed ticker
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Cache misconfiguration or poisoned lock
    #[error("Cache error: {0}")]
    Cache(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a [`DataError::MissingData`].
    pub fn missing(symbol: &str, reason: impl Into<String>) -> Self {
        Self::MissingData {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the provider simply has nothing for the symbol.
    pub const fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingData { .. })
    }
}
