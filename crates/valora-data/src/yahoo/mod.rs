//! Yahoo Finance data provider.

pub mod chart;
pub mod client;
pub mod statements;
pub mod summary;

pub use chart::{Chart, chart_url, parse_chart};
pub use client::{Auth, HttpResponse, YahooSession};
pub use statements::{parse_statement, statement_url};
pub use summary::{parse_summary, summary_url};

use crate::error::{DataError, Result};
use crate::series::{DateRange, Frequency};
use crate::snapshot::CompanySnapshot;
use crate::statement::{FinancialStatement, StatementKind};
use tracing::{debug, info};

/// Yahoo Finance provider for charts, snapshots and statements.
#[derive(Debug)]
pub struct YahooProvider {
    session: YahooSession,
}

impl YahooProvider {
    /// Create a provider over an existing session.
    pub const fn new(session: YahooSession) -> Self {
        Self { session }
    }

    /// Underlying HTTP session.
    pub const fn session(&self) -> &YahooSession {
        &self.session
    }

    /// Fetch closing prices and dividends.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "KO")
    /// * `range` - Inclusive date range
    /// * `frequency` - Daily or monthly sampling
    ///
    /// # Errors
    /// Returns `DataError::MissingData` when the provider has no prices for
    /// the symbol in the range.
    pub async fn fetch_chart(
        &self,
        symbol: &str,
        range: DateRange,
        frequency: Frequency,
    ) -> Result<Chart> {
        validate_symbol(symbol)?;
        let range = DateRange::new(range.start, range.end)?;

        let url = chart_url(symbol, &range, frequency);
        let response = self.session.get(&url, Auth::Anonymous).await?;
        check_status(symbol, &url, &response)?;

        let chart = parse_chart(symbol, frequency, &response.body)?;
        if chart.history.is_empty() {
            return Err(DataError::missing(symbol, "No prices returned for the range"));
        }

        info!(
            symbol,
            frequency = %frequency,
            points = chart.history.len(),
            dividends = chart.dividends.len(),
            cached = response.from_cache,
            "price history loaded"
        );
        Ok(chart)
    }

    /// Fetch the company snapshot.
    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<CompanySnapshot> {
        validate_symbol(symbol)?;

        let url = summary_url(symbol);
        let response = self.session.get(&url, Auth::Crumb).await?;
        check_status(symbol, &url, &response)?;

        let snapshot = parse_summary(symbol, &response.body)?;
        debug!(symbol, cached = response.from_cache, "snapshot loaded");
        Ok(snapshot)
    }

    /// Fetch one annual statement, covering fiscal years up to `range.end`.
    pub async fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        range: DateRange,
    ) -> Result<FinancialStatement> {
        validate_symbol(symbol)?;

        let url = statement_url(symbol, kind, range.period2());
        let response = self.session.get(&url, Auth::Anonymous).await?;
        check_status(symbol, &url, &response)?;

        let statement = parse_statement(symbol, kind, &response.body)?;
        debug!(
            symbol,
            statement = %kind,
            lines = statement.lines.len(),
            cached = response.from_cache,
            "statement loaded"
        );
        Ok(statement)
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    Ok(())
}

fn check_status(symbol: &str, url: &str, response: &HttpResponse) -> Result<()> {
    match response.status {
        200..=299 => Ok(()),
        404 => Err(DataError::missing(symbol, "Symbol not found")),
        status => Err(DataError::HttpStatus {
            status,
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheMode, SqliteCache, cache_key};
    use crate::series::Lookback;
    use chrono::{Duration, NaiveDate};

    fn provider_with(entries: &[(&str, u16, &str)]) -> YahooProvider {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();
        for (url, status, body) in entries {
            cache.put(&cache_key("GET", url), url, *status, body).unwrap();
        }
        YahooProvider::new(YahooSession::new(Some(cache), CacheMode::Use).unwrap())
    }

    fn range() -> DateRange {
        Lookback::FiveYears.range_ending(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap())
    }

    #[tokio::test]
    async fn test_cached_404_is_missing_data() {
        let url = chart_url("ZZZZ", &range(), Frequency::Daily);
        let provider = provider_with(&[(url.as_str(), 404, "{}")]);

        let err = provider
            .fetch_chart("ZZZZ", range(), Frequency::Daily)
            .await
            .unwrap_err();
        assert!(err.is_missing_data());
    }

    #[tokio::test]
    async fn test_empty_chart_is_missing_data() {
        let url = chart_url("KO", &range(), Frequency::Monthly);
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let provider = provider_with(&[(url.as_str(), 200, body)]);

        let err = provider
            .fetch_chart("KO", range(), Frequency::Monthly)
            .await
            .unwrap_err();
        assert!(err.is_missing_data());
    }

    #[tokio::test]
    async fn test_statement_from_cache() {
        let url = statement_url("KO", StatementKind::Income, range().period2());
        let body = r#"{"timeseries":{"result":[
            {"meta":{"type":["annualEBITDA"]},
             "annualEBITDA":[{"asOfDate":"2023-12-31","reportedValue":{"raw":15000000000}}]}
        ],"error":null}}"#;
        let provider = provider_with(&[(url.as_str(), 200, body)]);

        let income = provider
            .fetch_statement("KO", StatementKind::Income, range())
            .await
            .unwrap();
        assert_eq!(
            income.value(crate::statement::LineItem::Ebitda, 2023),
            Some(15_000_000_000.0)
        );
    }

    #[tokio::test]
    async fn test_empty_symbol_rejected() {
        let provider = provider_with(&[]);
        let err = provider.fetch_snapshot("  ").await.unwrap_err();
        assert!(matches!(err, DataError::InvalidSymbol(_)));
    }
}
