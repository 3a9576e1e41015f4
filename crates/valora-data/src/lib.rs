#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valora/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod series;
pub mod snapshot;
pub mod statement;
pub mod yahoo;

pub use cache::{CacheMode, CacheStats, SqliteCache};
pub use error::{DataError, Result};
pub use series::{DateRange, DividendEvent, Frequency, Lookback, PriceHistory, PricePoint, YearSeries};
pub use snapshot::CompanySnapshot;
pub use statement::{FinancialStatement, LineItem, StatementKind};
pub use yahoo::{YahooProvider, YahooSession};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
