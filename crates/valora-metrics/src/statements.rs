//! Derived statement series: margins, free cash flow, trends.

use crate::{finite, ratio};
use serde::{Deserialize, Serialize};
use valora_data::{FinancialStatement, LineItem, YearSeries};

/// Net income lines in order of preference.
pub const NET_INCOME_LINES: [LineItem; 2] = [LineItem::NetIncome, LineItem::NetIncomeContinuing];

/// Reported net income, falling back to continuing operations.
pub fn net_income(income: &FinancialStatement) -> Option<&YearSeries> {
    income.first_of(&NET_INCOME_LINES)
}

/// Margins for one fiscal year (fractions of revenue).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginRow {
    /// Fiscal year
    pub year: i32,
    /// Gross profit / revenue
    pub gross: Option<f64>,
    /// Operating income / revenue
    pub operating: Option<f64>,
    /// Net income / revenue
    pub net: Option<f64>,
}

/// Gross, operating and net margin for every year with revenue.
pub fn margins(income: &FinancialStatement) -> Vec<MarginRow> {
    let Some(revenue) = income.get(LineItem::TotalRevenue) else {
        return Vec::new();
    };
    let net = net_income(income);
    let margin = |series: Option<&YearSeries>, year: &i32, rev: f64| {
        series
            .and_then(|s| s.get(year))
            .and_then(|v| ratio(*v, rev))
    };

    revenue
        .iter()
        .map(|(year, rev)| MarginRow {
            year: *year,
            gross: margin(income.get(LineItem::GrossProfit), year, *rev),
            operating: margin(income.get(LineItem::OperatingIncome), year, *rev),
            net: margin(net, year, *rev),
        })
        .collect()
}

/// Operating cash flow split into capex and free cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    /// Fiscal year
    pub year: i32,
    /// Operating cash flow
    pub operating_cash_flow: f64,
    /// Capital expenditure as a positive amount
    pub capital_expenditure: f64,
    /// `operating cash flow − |capex|`
    pub free_cash_flow: f64,
    /// Free cash flow / operating cash flow
    pub fcf_share: Option<f64>,
}

/// FCF breakdown for years reporting both operating cash flow and capex.
pub fn free_cash_flow_breakdown(cash_flow: &FinancialStatement) -> Vec<CashFlowRow> {
    let (Some(ocf), Some(capex)) = (
        cash_flow.get(LineItem::OperatingCashFlow),
        cash_flow.get(LineItem::CapitalExpenditure),
    ) else {
        return Vec::new();
    };

    ocf.iter()
        .filter_map(|(year, ocf)| {
            let capex = capex.get(year)?.abs();
            let fcf = finite(ocf - capex)?;
            Some(CashFlowRow {
                year: *year,
                operating_cash_flow: *ocf,
                capital_expenditure: capex,
                free_cash_flow: fcf,
                fcf_share: ratio(fcf, *ocf),
            })
        })
        .collect()
}

/// Least-squares line through a yearly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    /// Change per year
    pub slope: f64,
    /// Value at year zero
    pub intercept: f64,
    /// Fitted value for each input year
    pub fitted: YearSeries,
}

impl LinearTrend {
    /// Value of the line at `year`.
    pub fn at(&self, year: i32) -> f64 {
        self.slope * f64::from(year) + self.intercept
    }
}

/// Fit `value = slope × year + intercept`. Needs two or more distinct years.
pub fn linear_trend(series: &YearSeries) -> Option<LinearTrend> {
    if series.len() < 2 {
        return None;
    }
    let n = series.len() as f64;
    let mean_x = series.keys().map(|y| f64::from(*y)).sum::<f64>() / n;
    let mean_y = series.values().sum::<f64>() / n;

    let (sxy, sxx) = series
        .iter()
        .fold((0.0, 0.0), |(sxy, sxx), (year, value)| {
            let dx = f64::from(*year) - mean_x;
            (sxy + dx * (value - mean_y), sxx + dx * dx)
        });

    let slope = ratio(sxy, sxx)?;
    let intercept = finite(mean_y - slope * mean_x)?;
    let fitted = series
        .keys()
        .map(|year| (*year, slope * f64::from(*year) + intercept))
        .collect();

    Some(LinearTrend {
        slope,
        intercept,
        fitted,
    })
}

/// Ordinary shares outstanding by year.
pub fn shares_outstanding(balance: &FinancialStatement) -> YearSeries {
    balance
        .get(LineItem::OrdinarySharesNumber)
        .cloned()
        .unwrap_or_default()
}
