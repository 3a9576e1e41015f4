//! Geraldine Weiss dividend-yield bands.
//!
//! A stock is considered overvalued near its historical minimum yield and
//! undervalued near its historical maximum. With annual dividend `D` and
//! extreme yields `y_min`/`y_max` over the month-end history, the bands are
//! `D / y_min` (overvalued) and `D / y_max` (undervalued).

use crate::dividends::{Cagr, annual_dividends, dividend_cagr};
use crate::ratio;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use valora_data::{DividendEvent, PriceHistory, YearSeries};

/// Inputs of a Weiss analysis.
#[derive(Debug, Clone, Copy)]
pub struct WeissInputs<'a> {
    /// Daily closes over the analysis window
    pub daily: &'a PriceHistory,
    /// Dividend events
    pub dividends: &'a [DividendEvent],
    /// First and last calendar year of the analysis price history
    pub years: (i32, i32),
    /// Today's date; the current year's dividend is projected from the CAGR
    pub today: NaiveDate,
    /// Quoted current price, if known
    pub current_price: Option<f64>,
}

/// One month-end observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeissRow {
    /// Last trading day of the month
    pub date: NaiveDate,
    /// Calendar year
    pub year: i32,
    /// Month name
    pub month: String,
    /// Month-end close
    pub price: f64,
    /// Annual dividend used for the year (projected for the current year)
    pub annual_dividend: Option<f64>,
    /// `annual_dividend / price` (fraction)
    pub dividend_yield: Option<f64>,
    /// Overvalued price band
    pub overvalued: Option<f64>,
    /// Undervalued price band
    pub undervalued: Option<f64>,
}

/// Price bands for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeissBand {
    /// Calendar year
    pub year: i32,
    /// Band start (January 1st)
    pub start: NaiveDate,
    /// Band end (next January 1st, or the last close for the final year)
    pub end: NaiveDate,
    /// Annual dividend
    pub annual_dividend: f64,
    /// Overvalued price
    pub overvalued: f64,
    /// Undervalued price
    pub undervalued: f64,
}

/// Result of a Weiss analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeissAnalysis {
    /// Annual dividends restricted to the analysis years
    pub annual: YearSeries,
    /// Dividend CAGR over those years
    pub cagr: Option<Cagr>,
    /// Month-end rows in date order
    pub rows: Vec<WeissRow>,
    /// Per-year bands
    pub bands: Vec<WeissBand>,
    /// Lowest month-end yield
    pub min_yield: f64,
    /// Highest month-end yield
    pub max_yield: f64,
    /// Quoted price, falling back to the last daily close
    pub current_price: f64,
    /// Dividend of the latest year row
    pub last_dividend: Option<f64>,
    /// `last_dividend / min_yield`
    pub overvalued_price: Option<f64>,
    /// `last_dividend / max_yield`
    pub undervalued_price: Option<f64>,
    /// Undervalued band of the latest month
    pub latest_undervalued: Option<f64>,
}

/// Dividend for `year`: projected from the prior year at the CAGR for the
/// current year, otherwise the reported total.
pub fn adjusted_dividend(
    annual: &YearSeries,
    cagr: Option<&Cagr>,
    year: i32,
    current_year: i32,
) -> Option<f64> {
    if year == current_year {
        if let (Some(cagr), Some(previous)) = (cagr, annual.get(&(year - 1))) {
            return Some(previous * (1.0 + cagr.rate));
        }
    }
    annual.get(&year).copied()
}

/// Run the analysis. `None` when there are no dividends, no daily prices or
/// no month with a yield.
pub fn analyze(inputs: &WeissInputs<'_>) -> Option<WeissAnalysis> {
    if inputs.dividends.is_empty() || inputs.daily.is_empty() {
        return None;
    }

    let annual = annual_dividends(inputs.dividends, Some(inputs.years));
    let cagr = dividend_cagr(&annual);
    let current_year = inputs.today.year();

    let mut rows: Vec<WeissRow> = inputs
        .daily
        .month_end_points()
        .into_iter()
        .map(|point| {
            let year = point.date.year();
            let annual_dividend = adjusted_dividend(&annual, cagr.as_ref(), year, current_year);
            WeissRow {
                date: point.date,
                year,
                month: point.date.format("%B").to_string(),
                price: point.close,
                annual_dividend,
                dividend_yield: annual_dividend.and_then(|d| ratio(d, point.close)),
                overvalued: None,
                undervalued: None,
            }
        })
        .collect();

    let yields: Vec<f64> = rows.iter().filter_map(|r| r.dividend_yield).collect();
    let min_yield = yields.iter().copied().reduce(f64::min)?;
    let max_yield = yields.iter().copied().reduce(f64::max)?;

    for row in &mut rows {
        row.overvalued = row.annual_dividend.and_then(|d| ratio(d, min_yield));
        row.undervalued = row.annual_dividend.and_then(|d| ratio(d, max_yield));
    }

    let last_close = inputs.daily.last()?;
    let mut years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    years.dedup();
    let last_band_year = years
        .iter()
        .copied()
        .filter(|y| adjusted_dividend(&annual, cagr.as_ref(), *y, current_year).is_some())
        .max();

    let bands = years
        .iter()
        .filter_map(|&year| {
            let dividend = adjusted_dividend(&annual, cagr.as_ref(), year, current_year)?;
            let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let end = if Some(year) == last_band_year {
                last_close.date
            } else {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            };
            Some(WeissBand {
                year,
                start,
                end,
                annual_dividend: dividend,
                overvalued: ratio(dividend, min_yield)?,
                undervalued: ratio(dividend, max_yield)?,
            })
        })
        .collect();

    let latest_year = rows.last().map(|r| r.year);
    let last_dividend = rows
        .iter()
        .rev()
        .find(|r| Some(r.year) == latest_year)
        .and_then(|r| r.annual_dividend);

    Some(WeissAnalysis {
        cagr,
        min_yield,
        max_yield,
        current_price: inputs.current_price.unwrap_or(last_close.close),
        last_dividend,
        overvalued_price: last_dividend.and_then(|d| ratio(d, min_yield)),
        undervalued_price: last_dividend.and_then(|d| ratio(d, max_yield)),
        latest_undervalued: rows.last().and_then(|r| r.undervalued),
        annual,
        rows,
        bands,
    })
}
