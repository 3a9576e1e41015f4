//! Data pipeline for one analysis.
//!
//! Fetches prices, dividends, the company snapshot and the three annual
//! statements for a ticker. Only the price history is required; every other
//! input degrades to an empty value with a logged warning so the dashboard
//! can still render the sections that do not need it.

use super::cache_manager;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use valora::AnalysisRequest;
use valora_data::{
    CacheMode, CompanySnapshot, DataError, DividendEvent, FinancialStatement, Frequency,
    PriceHistory, StatementKind, YahooProvider, YahooSession, cache::DEFAULT_TTL_HOURS,
};

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// The provider returned no prices for the ticker.
    #[error("No data found for ticker {0}. Check the symbol.")]
    NoData(String),
    /// Data fetch error from Yahoo.
    #[error("Data fetch error: {0}")]
    Fetch(#[from] DataError),
}

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached entries).
    pub force_refresh: bool,
    /// Cache database, `None` for the platform default.
    pub cache_path: Option<PathBuf>,
    /// Lifetime of cached responses.
    pub ttl_hours: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            cache_path: None,
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

impl FetchConfig {
    /// How the HTTP session should treat the cache.
    pub(crate) const fn cache_mode(&self) -> CacheMode {
        if !self.use_cache {
            CacheMode::Bypass
        } else if self.force_refresh {
            CacheMode::Refresh
        } else {
            CacheMode::Use
        }
    }

    /// Resolved cache database path.
    pub(crate) fn cache_path(&self) -> PathBuf {
        cache_manager::get_cache_path(self.cache_path.as_deref())
    }
}

/// Everything fetched for one analysis.
#[derive(Debug, Clone)]
pub(crate) struct Dataset {
    /// Validated inputs
    pub request: AnalysisRequest,
    /// Date the analysis window ends on
    pub today: NaiveDate,
    /// Prices at the requested frequency over the lookback
    pub prices: PriceHistory,
    /// Daily prices over the lookback, empty when unavailable
    pub daily: PriceHistory,
    /// Dividends since January 1st of the first lookback year
    pub dividends: Vec<DividendEvent>,
    /// Company snapshot, empty when unavailable
    pub snapshot: CompanySnapshot,
    /// Annual income statement
    pub income: FinancialStatement,
    /// Annual balance sheet
    pub balance: FinancialStatement,
    /// Annual cash flow statement
    pub cash_flow: FinancialStatement,
}

impl Dataset {
    /// Ticker of the analysis.
    pub(crate) fn symbol(&self) -> &str {
        self.request.symbol()
    }

    /// First and last calendar year of the price history.
    pub(crate) fn years(&self) -> Option<(i32, i32)> {
        self.prices.year_range()
    }
}

fn step(progress: Option<&ProgressBar>, message: &str) {
    if let Some(pb) = progress {
        pb.set_message(message.to_string());
    }
    debug!("{}", message);
}

/// Open the HTTP session described by `config`.
///
/// A cache that cannot be opened is logged and skipped.
pub(crate) fn open_session(config: &FetchConfig) -> Result<YahooSession, DataPipelineError> {
    let mode = config.cache_mode();
    let cache = if mode == CacheMode::Bypass {
        None
    } else {
        let path = config.cache_path();
        match cache_manager::open_cache(&path, config.ttl_hours) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache unavailable, continuing without it");
                None
            }
        }
    };
    Ok(YahooSession::new(cache, mode)?)
}

/// Fetch the dataset for `request`, with the analysis window ending on `today`.
///
/// # Errors
///
/// Returns [`DataPipelineError::NoData`] when the ticker has no prices in the
/// window, and [`DataPipelineError::Fetch`] when the price request itself fails.
pub(crate) async fn fetch_dataset(
    provider: &YahooProvider,
    request: &AnalysisRequest,
    today: NaiveDate,
    progress: Option<&ProgressBar>,
) -> Result<Dataset, DataPipelineError> {
    let symbol = request.symbol();
    let range = request.range(today);

    step(progress, &format!("Fetching {} prices...", request.frequency()));
    let chart = match provider.fetch_chart(symbol, range, request.frequency()).await {
        Ok(chart) => chart,
        Err(e) if e.is_missing_data() => return Err(DataPipelineError::NoData(symbol.to_string())),
        Err(e) => return Err(e.into()),
    };
    let daily = if request.frequency() == Frequency::Daily {
        chart.history.clone()
    } else {
        step(progress, "Fetching daily prices...");
        match provider.fetch_chart(symbol, range, Frequency::Daily).await {
            Ok(daily) => daily.history,
            Err(e) => {
                warn!(symbol, error = %e, "daily prices unavailable");
                PriceHistory::new(symbol, Frequency::Daily, Vec::new())
            }
        }
    };

    step(progress, "Fetching dividends...");
    let dividends = match provider
        .fetch_chart(symbol, range.from_year_start(), Frequency::Monthly)
        .await
    {
        Ok(monthly) => monthly.dividends,
        Err(e) => {
            warn!(symbol, error = %e, "dividend history unavailable, using price events");
            chart.dividends.clone()
        }
    };

    step(progress, "Fetching company data...");
    let snapshot = match provider.fetch_snapshot(symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(symbol, error = %e, "company snapshot unavailable");
            CompanySnapshot::empty(symbol)
        }
    };

    let mut statements = Vec::with_capacity(StatementKind::ALL.len());
    for kind in StatementKind::ALL {
        step(progress, &format!("Fetching {}...", kind));
        let statement = match provider.fetch_statement(symbol, kind, range).await {
            Ok(statement) => statement,
            Err(e) => {
                warn!(symbol, statement = %kind, error = %e, "statement unavailable");
                FinancialStatement::new(kind)
            }
        };
        statements.push(statement);
    }
    let [income, balance, cash_flow] = take_statements(statements);
    info!(
        symbol,
        daily = daily.len(),
        dividends = dividends.len(),
        statements = [&income, &balance, &cash_flow].iter().filter(|s| !s.is_empty()).count(),
        "dataset assembled"
    );

    Ok(Dataset {
        request: request.clone(),
        today,
        prices: chart.history,
        daily,
        dividends,
        snapshot,
        income,
        balance,
        cash_flow,
    })
}

/// Sort fetched statements into (income, balance sheet, cash flow).
fn take_statements(statements: Vec<FinancialStatement>) -> [FinancialStatement; 3] {
    let mut slots = StatementKind::ALL.map(FinancialStatement::new);
    for statement in statements {
        if let Some(index) = StatementKind::ALL.iter().position(|k| *k == statement.kind) {
            slots[index] = statement;
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use valora_data::LineItem;

    #[rstest]
    #[case(true, false, CacheMode::Use)]
    #[case(true, true, CacheMode::Refresh)]
    #[case(false, false, CacheMode::Bypass)]
    #[case(false, true, CacheMode::Bypass)]
    fn test_cache_mode(#[case] use_cache: bool, #[case] refresh: bool, #[case] mode: CacheMode) {
        let config = FetchConfig {
            use_cache,
            force_refresh: refresh,
            ..FetchConfig::default()
        };
        assert_eq!(config.cache_mode(), mode);
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert!(config.use_cache);
        assert_eq!(config.ttl_hours, 24);
        assert_eq!(config.cache_path(), cache_manager::default_cache_path());
    }

    #[test]
    fn test_take_statements_orders_by_kind() {
        let mut cash_flow = FinancialStatement::new(StatementKind::CashFlow);
        cash_flow.insert(LineItem::FreeCashFlow, 2023, 9.7e9);
        let [income, balance, cash] = take_statements(vec![cash_flow]);
        assert_eq!(income.kind, StatementKind::Income);
        assert!(income.is_empty());
        assert_eq!(balance.kind, StatementKind::BalanceSheet);
        assert_eq!(cash.value(LineItem::FreeCashFlow, 2023), Some(9.7e9));
    }

    #[test]
    fn test_open_session_without_cache() {
        let config = FetchConfig {
            use_cache: false,
            ..FetchConfig::default()
        };
        let session = open_session(&config).unwrap();
        assert_eq!(session.mode(), CacheMode::Bypass);
    }

    #[test]
    fn test_open_session_with_temp_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig {
            cache_path: Some(dir.path().join("http_cache.db")),
            ..FetchConfig::default()
        };
        let session = open_session(&config).unwrap();
        assert_eq!(session.mode(), CacheMode::Use);
        assert!(dir.path().join("http_cache.db").exists());
    }
}
