//! Point-in-time company information.

use serde::{Deserialize, Serialize};

/// Descriptive and valuation fields for a company at the time of the request.
///
/// Every numeric field is optional: providers omit them routinely and an
/// absent value must never abort an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    /// Ticker symbol
    pub symbol: String,
    /// Full company name
    pub long_name: Option<String>,
    /// Sector
    pub sector: Option<String>,
    /// Industry
    pub industry: Option<String>,
    /// Trading currency
    pub currency: Option<String>,
    /// Current share price
    pub current_price: Option<f64>,
    /// Forward annual dividend per share
    pub dividend_rate: Option<f64>,
    /// Payout ratio (fraction)
    pub payout_ratio: Option<f64>,
    /// Trailing price to earnings
    pub trailing_pe: Option<f64>,
    /// Return on equity (fraction)
    pub return_on_equity: Option<f64>,
    /// Trailing twelve-month EPS
    pub trailing_eps: Option<f64>,
    /// Price to book
    pub price_to_book: Option<f64>,
    /// Market capitalization
    pub market_cap: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: Option<f64>,
}

impl CompanySnapshot {
    /// An empty snapshot for `symbol`.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Company name, falling back to the symbol.
    pub fn display_name(&self) -> &str {
        self.long_name.as_deref().unwrap_or(&self.symbol)
    }
}
