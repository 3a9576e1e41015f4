//! Inputs of one analysis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use valora_data::{DateRange, Frequency, Lookback};

/// Default desired dividend yield, in percent.
pub const DEFAULT_DESIRED_YIELD: f64 = 3.0;

/// Smallest accepted desired dividend yield, in percent.
pub const MIN_DESIRED_YIELD: f64 = 0.1;

const MAX_SYMBOL_LEN: usize = 16;

/// Errors raised while validating a request.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    /// The ticker is empty or contains characters no exchange uses.
    #[error("Invalid ticker '{0}': use letters, digits and . - ^ = only")]
    InvalidSymbol(String),

    /// Desired yield below the minimum or not a number.
    #[error("Desired yield must be at least 0.1%, got {0}")]
    DesiredYield(f64),
}

/// Ticker, lookback, frequency and desired yield of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    symbol: String,
    lookback: Lookback,
    frequency: Frequency,
    desired_yield: f64,
}

impl AnalysisRequest {
    /// Validate and build a request. The ticker is trimmed and uppercased;
    /// `desired_yield` is in percent.
    pub fn new(
        symbol: &str,
        lookback: Lookback,
        frequency: Frequency,
        desired_yield: f64,
    ) -> Result<Self, RequestError> {
        let symbol = normalize_symbol(symbol)?;
        if !desired_yield.is_finite() || desired_yield < MIN_DESIRED_YIELD {
            return Err(RequestError::DesiredYield(desired_yield));
        }
        Ok(Self {
            symbol,
            lookback,
            frequency,
            desired_yield,
        })
    }

    /// Request with the default lookback, frequency and desired yield.
    pub fn for_symbol(symbol: &str) -> Result<Self, RequestError> {
        Self::new(
            symbol,
            Lookback::default(),
            Frequency::default(),
            DEFAULT_DESIRED_YIELD,
        )
    }

    /// Normalized ticker.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Lookback period.
    pub const fn lookback(&self) -> Lookback {
        self.lookback
    }

    /// Price sampling frequency.
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Desired yield in percent.
    pub const fn desired_yield(&self) -> f64 {
        self.desired_yield
    }

    /// Desired yield as a fraction.
    pub fn desired_yield_fraction(&self) -> f64 {
        self.desired_yield / 100.0
    }

    /// Analysis window ending on `today`.
    pub fn range(&self, today: NaiveDate) -> DateRange {
        self.lookback.range_ending(today)
    }
}

/// Trim and uppercase a ticker, rejecting empty or malformed ones.
pub fn normalize_symbol(symbol: &str) -> Result<String, RequestError> {
    let normalized = symbol.trim().to_uppercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= MAX_SYMBOL_LEN
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(normalized)
    } else {
        Err(RequestError::InvalidSymbol(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("aapl", "AAPL")]
    #[case(" ko ", "KO")]
    #[case("brk-b", "BRK-B")]
    #[case("san.mc", "SAN.MC")]
    #[case("^gspc", "^GSPC")]
    fn test_normalize_symbol(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_symbol(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("KO;DROP")]
    #[case("A B")]
    #[case("ABCDEFGHIJKLMNOPQ")]
    fn test_invalid_symbol(#[case] input: &str) {
        assert!(matches!(normalize_symbol(input), Err(RequestError::InvalidSymbol(_))));
    }

    #[rstest]
    #[case(0.1, true)]
    #[case(3.0, true)]
    #[case(0.05, false)]
    #[case(-1.0, false)]
    #[case(f64::NAN, false)]
    fn test_desired_yield_bounds(#[case] desired: f64, #[case] ok: bool) {
        let request = AnalysisRequest::new("KO", Lookback::FiveYears, Frequency::Daily, desired);
        assert_eq!(request.is_ok(), ok);
    }

    #[test]
    fn test_defaults_and_range() {
        let request = AnalysisRequest::for_symbol("ko").unwrap();
        assert_eq!(request.lookback(), Lookback::FiveYears);
        assert_eq!(request.frequency(), Frequency::Daily);
        assert_eq!(request.desired_yield(), DEFAULT_DESIRED_YIELD);

        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let range = request.range(today);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2019, 6, 15).unwrap());
        assert_eq!(range.end, today);
    }
}
