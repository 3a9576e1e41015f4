//! Time-indexed price and dividend series.

use crate::error::{DataError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Values keyed by calendar or fiscal year.
pub type YearSeries = BTreeMap<i32, f64>;

/// Sampling frequency of a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One close per trading day
    #[default]
    Daily,
    /// One close per month
    Monthly,
}

impl Frequency {
    /// Provider interval parameter.
    pub const fn interval(&self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Monthly => "1mo",
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "d" | "daily" => Ok(Self::Daily),
            "1mo" | "m" | "monthly" => Ok(Self::Monthly),
            other => Err(DataError::Parse(format!(
                "Invalid interval '{}': expected daily or monthly",
                other
            ))),
        }
    }
}

/// Lookback period of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lookback {
    /// Five years
    #[default]
    FiveYears,
    /// Ten years
    TenYears,
    /// Fifteen years
    FifteenYears,
    /// Twenty years
    TwentyYears,
}

impl Lookback {
    /// All supported lookbacks, shortest first.
    pub const ALL: [Self; 4] = [
        Self::FiveYears,
        Self::TenYears,
        Self::FifteenYears,
        Self::TwentyYears,
    ];

    /// Length in years.
    pub const fn years(&self) -> u32 {
        match self {
            Self::FiveYears => 5,
            Self::TenYears => 10,
            Self::FifteenYears => 15,
            Self::TwentyYears => 20,
        }
    }

    /// Short code such as `5y`.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::FifteenYears => "15y",
            Self::TwentyYears => "20y",
        }
    }

    /// The date range covering this lookback and ending on `end` (inclusive).
    pub fn range_ending(&self, end: NaiveDate) -> DateRange {
        let start = end
            .checked_sub_months(Months::new(self.years() * 12))
            .unwrap_or(NaiveDate::MIN);
        DateRange { start, end }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lookback {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.code() == normalized || l.years().to_string() == normalized)
            .ok_or_else(|| {
                DataError::Parse(format!(
                    "Invalid period '{}': expected one of 5y, 10y, 15y, 20y",
                    s
                ))
            })
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a validated range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Same range, widened to start on January 1st of its first year.
    pub fn from_year_start(&self) -> Self {
        let start = NaiveDate::from_ymd_opt(self.start.year(), 1, 1).unwrap_or(self.start);
        Self {
            start,
            end: self.end,
        }
    }

    /// Unix timestamp of `start` at UTC midnight.
    pub fn period1(&self) -> i64 {
        midnight_timestamp(self.start)
    }

    /// Unix timestamp of the UTC midnight following `end`.
    pub fn period2(&self) -> i64 {
        midnight_timestamp(self.end) + 86_400
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// One closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price (split and dividend adjusted)
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered closing prices for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Ticker symbol
    pub symbol: String,
    /// Sampling frequency
    pub frequency: Frequency,
    /// Points in ascending date order
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Build a history, dropping non-finite closes and sorting by date.
    pub fn new(symbol: impl Into<String>, frequency: Frequency, points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.close.is_finite())
            .collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self {
            symbol: symbol.into(),
            frequency,
            points,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the history has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest point.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// Latest point.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Latest closing price.
    pub fn last_close(&self) -> Option<f64> {
        self.last().map(|p| p.close)
    }

    /// Calendar years of the first and last point.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((self.first()?.date.year(), self.last()?.date.year()))
    }

    /// Last close of each calendar year.
    pub fn year_end_closes(&self) -> YearSeries {
        self.points
            .iter()
            .map(|p| (p.date.year(), p.close))
            .collect()
    }

    /// Last point of each calendar month, in date order.
    pub fn month_end_points(&self) -> Vec<PricePoint> {
        let mut by_month: BTreeMap<(i32, u32), PricePoint> = BTreeMap::new();
        for point in &self.points {
            by_month.insert((point.date.year(), point.date.month()), *point);
        }
        by_month.into_values().collect()
    }
}

/// A single cash dividend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Ex-dividend date
    pub date: NaiveDate,
    /// Amount per share
    pub amount: f64,
}

impl DividendEvent {
    /// Create a new dividend event.
    pub const fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("5y", Lookback::FiveYears)]
    #[case("10Y", Lookback::TenYears)]
    #[case("15", Lookback::FifteenYears)]
    #[case(" 20y ", Lookback::TwentyYears)]
    fn test_lookback_parse(#[case] input: &str, #[case] expected: Lookback) {
        assert_eq!(input.parse::<Lookback>().unwrap(), expected);
    }

    #[test]
    fn test_lookback_rejects_unknown() {
        assert!("7y".parse::<Lookback>().is_err());
    }

    #[rstest]
    #[case("daily", Frequency::Daily)]
    #[case("1d", Frequency::Daily)]
    #[case("Monthly", Frequency::Monthly)]
    #[case("1mo", Frequency::Monthly)]
    fn test_frequency_parse(#[case] input: &str, #[case] expected: Frequency) {
        assert_eq!(input.parse::<Frequency>().unwrap(), expected);
    }

    #[test]
    fn test_range_ending() {
        let range = Lookback::TenYears.range_ending(date(2024, 2, 29));
        assert_eq!(range.start, date(2014, 2, 28));
        assert_eq!(range.end, date(2024, 2, 29));
        assert_eq!(range.from_year_start().start, date(2014, 1, 1));
    }

    #[test]
    fn test_range_timestamps_are_midnight_aligned() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        assert_eq!(range.period1(), 1_704_067_200);
        assert_eq!(range.period2(), 1_704_067_200 + 2 * 86_400);
    }

    #[test]
    fn test_invalid_range() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_history_sorts_and_drops_nan() {
        let history = PriceHistory::new(
            "KO",
            Frequency::Daily,
            vec![
                PricePoint::new(date(2024, 1, 3), 61.0),
                PricePoint::new(date(2024, 1, 2), f64::NAN),
                PricePoint::new(date(2024, 1, 1), 60.0),
            ],
        );
        assert_eq!(history.len(), 2);
        assert_eq!(history.first().unwrap().close, 60.0);
        assert_eq!(history.last_close(), Some(61.0));
    }

    #[test]
    fn test_year_end_and_month_end() {
        let history = PriceHistory::new(
            "KO",
            Frequency::Daily,
            vec![
                PricePoint::new(date(2022, 12, 1), 10.0),
                PricePoint::new(date(2022, 12, 30), 11.0),
                PricePoint::new(date(2023, 1, 5), 12.0),
                PricePoint::new(date(2023, 1, 31), 13.0),
                PricePoint::new(date(2023, 2, 10), 14.0),
            ],
        );

        let year_end = history.year_end_closes();
        assert_eq!(year_end.get(&2022), Some(&11.0));
        assert_eq!(year_end.get(&2023), Some(&14.0));

        let months: Vec<f64> = history.month_end_points().iter().map(|p| p.close).collect();
        assert_eq!(months, vec![11.0, 13.0, 14.0]);
        assert_eq!(history.year_range(), Some((2022, 2023)));
    }
}
