//! Dividend history metrics.

use crate::{finite, ratio};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use valora_data::{DividendEvent, PriceHistory, YearSeries};

/// Calendar-year dividend totals, restricted to `years` (inclusive) when given.
pub fn annual_dividends(events: &[DividendEvent], years: Option<(i32, i32)>) -> YearSeries {
    let mut annual = YearSeries::new();
    for event in events.iter().filter(|e| e.amount.is_finite()) {
        *annual.entry(event.date.year()).or_insert(0.0) += event.amount;
    }
    if let Some((start, end)) = years {
        annual.retain(|year, _| (start..=end).contains(year));
    }
    annual
}

/// Compound annual growth of the dividend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cagr {
    /// Growth rate (fraction)
    pub rate: f64,
    /// First year of the span
    pub start_year: i32,
    /// Last complete year of the span
    pub end_year: i32,
}

impl Cagr {
    /// Number of compounding periods.
    pub const fn years(&self) -> i32 {
        self.end_year - self.start_year
    }
}

/// Dividend CAGR between the first and the second-to-last annual value.
///
/// The latest year is treated as partial and skipped. Needs at least three
/// annual values.
pub fn dividend_cagr(annual: &YearSeries) -> Option<Cagr> {
    if annual.len() < 3 {
        return None;
    }
    let (&start_year, &first) = annual.iter().next()?;
    let (&end_year, &penultimate) = annual.iter().rev().nth(1)?;
    let periods = end_year - start_year;
    if periods <= 0 {
        return None;
    }
    let growth = ratio(penultimate, first)?;
    if growth < 0.0 {
        return None;
    }
    let rate = finite(growth.powf(1.0 / f64::from(periods)) - 1.0)?;
    Some(Cagr {
        rate,
        start_year,
        end_year,
    })
}

/// Dividend yield on one price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldPoint {
    /// Observation date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
    /// Total dividend of the observation's year
    pub annual_dividend: f64,
    /// `annual_dividend / close` (fraction)
    pub dividend_yield: f64,
}

/// Yield of every price point against its year's annual dividend.
///
/// Points after the last complete dividend year are dropped when more than
/// one annual value exists; points with no dividend for their year are skipped.
pub fn yield_history(prices: &PriceHistory, annual: &YearSeries) -> Vec<YieldPoint> {
    let last_full_year = if annual.len() > 1 {
        annual.keys().rev().nth(1).copied()
    } else {
        None
    };

    prices
        .points
        .iter()
        .filter(|p| last_full_year.is_none_or(|last| p.date.year() <= last))
        .filter_map(|p| {
            let annual_dividend = *annual.get(&p.date.year())?;
            Some(YieldPoint {
                date: p.date,
                close: p.close,
                annual_dividend,
                dividend_yield: ratio(annual_dividend, p.close)?,
            })
        })
        .collect()
}

/// Average, maximum and minimum of a yield history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldStats {
    /// Mean yield (fraction)
    pub average: f64,
    /// Highest yield (fraction)
    pub max: f64,
    /// Lowest yield (fraction)
    pub min: f64,
}

impl YieldStats {
    /// Statistics over `history`; `None` when it is empty.
    pub fn from_history(history: &[YieldPoint]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }
        let yields = history.iter().map(|p| p.dividend_yield);
        let sum: f64 = yields.clone().sum();
        Some(Self {
            average: sum / history.len() as f64,
            max: yields.clone().fold(f64::NEG_INFINITY, f64::max),
            min: yields.fold(f64::INFINITY, f64::min),
        })
    }
}

/// Dividends paid as a share of free cash flow, for years reporting both.
///
/// Dividends are reported as outflows, so their absolute value is used.
pub fn fcf_payout(free_cash_flow: &YearSeries, dividends_paid: &YearSeries) -> YearSeries {
    free_cash_flow
        .iter()
        .filter_map(|(year, fcf)| {
            let paid = dividends_paid.get(year)?.abs();
            Some((*year, ratio(paid, *fcf)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use valora_data::{Frequency, PricePoint};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(values: &[(i32, f64)]) -> YearSeries {
        values.iter().copied().collect()
    }

    #[test]
    fn test_annual_dividends_sums_and_restricts() {
        let events = vec![
            DividendEvent::new(date(2019, 12, 1), 0.40),
            DividendEvent::new(date(2020, 3, 1), 0.41),
            DividendEvent::new(date(2020, 6, 1), 0.41),
            DividendEvent::new(date(2021, 3, 1), 0.42),
        ];
        let annual = annual_dividends(&events, Some((2020, 2021)));
        assert_eq!(annual.len(), 2);
        assert_relative_eq!(annual[&2020], 0.82, epsilon = 1e-12);
        assert_relative_eq!(annual[&2021], 0.42, epsilon = 1e-12);

        assert_eq!(annual_dividends(&events, None).len(), 3);
    }

    #[test]
    fn test_dividend_cagr_skips_last_year() {
        let annual = series(&[(2020, 1.00), (2021, 1.10), (2022, 1.21)]);
        let cagr = dividend_cagr(&annual).unwrap();
        assert_relative_eq!(cagr.rate, 0.10, epsilon = 1e-12);
        assert_eq!((cagr.start_year, cagr.end_year, cagr.years()), (2020, 2021, 1));
    }

    #[test]
    fn test_dividend_cagr_multi_year() {
        let annual = series(&[(2018, 1.0), (2019, 1.05), (2020, 1.1025), (2021, 0.3)]);
        let cagr = dividend_cagr(&annual).unwrap();
        assert_relative_eq!(cagr.rate, 0.05, epsilon = 1e-12);
        assert_eq!(cagr.years(), 2);
    }

    #[test]
    fn test_dividend_cagr_unavailable() {
        assert!(dividend_cagr(&series(&[(2020, 1.0), (2021, 1.1)])).is_none());
        assert!(dividend_cagr(&series(&[(2020, 0.0), (2021, 1.1), (2022, 1.2)])).is_none());
    }

    #[test]
    fn test_yield_history_excludes_partial_year() {
        let prices = PriceHistory::new(
            "KO",
            Frequency::Monthly,
            vec![
                PricePoint::new(date(2021, 6, 1), 50.0),
                PricePoint::new(date(2022, 6, 1), 40.0),
                PricePoint::new(date(2023, 6, 1), 45.0),
                PricePoint::new(date(2024, 6, 1), 55.0),
            ],
        );
        let annual = series(&[(2022, 2.0), (2023, 1.8), (2024, 0.5)]);

        let history = yield_history(&prices, &annual);
        assert_eq!(history.len(), 2);
        assert_relative_eq!(history[0].dividend_yield, 0.05, epsilon = 1e-12);
        assert_relative_eq!(history[1].dividend_yield, 0.04, epsilon = 1e-12);

        let stats = YieldStats::from_history(&history).unwrap();
        assert_relative_eq!(stats.average, 0.045, epsilon = 1e-12);
        assert_relative_eq!(stats.max, 0.05, epsilon = 1e-12);
        assert_relative_eq!(stats.min, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_yield_stats_empty() {
        assert!(YieldStats::from_history(&[]).is_none());
    }

    #[test]
    fn test_fcf_payout() {
        let fcf = series(&[(2021, 100.0), (2022, 0.0), (2023, 80.0)]);
        let paid = series(&[(2021, -50.0), (2022, -40.0)]);
        let payout = fcf_payout(&fcf, &paid);
        assert_eq!(payout.len(), 1);
        assert_relative_eq!(payout[&2021], 0.5, epsilon = 1e-12);
    }
}
