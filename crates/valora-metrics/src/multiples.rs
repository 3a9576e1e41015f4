//! Debt and market multiples.

use crate::{finite, ratio};
use serde::{Deserialize, Serialize};
use valora_data::{FinancialStatement, LineItem, PriceHistory, YearSeries};

/// Debt lines in order of preference.
pub const DEBT_LINES: [LineItem; 2] = [LineItem::TotalDebt, LineItem::LongTermDebt];

/// Cash lines in order of preference.
pub const CASH_LINES: [LineItem; 2] = [LineItem::CashAndCashEquivalents, LineItem::CashFinancial];

/// `debt − cash` for years reporting both.
pub fn net_debt(balance: &FinancialStatement) -> YearSeries {
    let (Some(debt), Some(cash)) = (balance.first_of(&DEBT_LINES), balance.first_of(&CASH_LINES))
    else {
        return YearSeries::new();
    };
    debt.iter()
        .filter_map(|(year, d)| Some((*year, finite(d - cash.get(year)?)?)))
        .collect()
}

/// Net debt over free cash flow.
pub fn net_debt_to_fcf(net_debt: &YearSeries, free_cash_flow: &YearSeries) -> YearSeries {
    net_debt
        .iter()
        .filter_map(|(year, nd)| Some((*year, ratio(*nd, *free_cash_flow.get(year)?)?)))
        .collect()
}

/// Year-end price against basic EPS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerRow {
    /// Fiscal year
    pub year: i32,
    /// Basic EPS
    pub eps: f64,
    /// Last close of the year
    pub price: f64,
    /// Price over EPS, unavailable for zero EPS
    pub per: Option<f64>,
}

/// PER per year that has both a basic EPS and a year-end close.
pub fn per_history(basic_eps: &YearSeries, prices: &PriceHistory) -> Vec<PerRow> {
    let year_end = prices.year_end_closes();
    basic_eps
        .iter()
        .filter_map(|(year, eps)| {
            let price = *year_end.get(year)?;
            Some(PerRow {
                year: *year,
                eps: *eps,
                price,
                per: ratio(price, *eps),
            })
        })
        .collect()
}

/// Current EV/EBITDA from the latest balance-sheet year:
/// `(market cap + debt − cash) / EBITDA`, all taken from that year.
pub fn ev_ebitda_current(
    market_cap: Option<f64>,
    balance: &FinancialStatement,
    income: &FinancialStatement,
) -> Option<f64> {
    let market_cap = market_cap?;
    let year = balance.latest_year()?;
    let debt = *balance.first_of(&DEBT_LINES)?.get(&year)?;
    let cash = *balance.first_of(&CASH_LINES)?.get(&year)?;
    let ebitda = income.value(LineItem::Ebitda, year)?;
    ratio(market_cap + debt - cash, ebitda)
}

/// Enterprise value and EBITDA for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvRow {
    /// Fiscal year
    pub year: i32,
    /// Reported EBITDA
    pub ebitda: Option<f64>,
    /// Current market cap plus the year's net debt
    pub enterprise_value: Option<f64>,
    /// EV over EBITDA
    pub ev_to_ebitda: Option<f64>,
}

/// EV and EV/EBITDA per year, using today's market cap for every year.
pub fn ev_ebitda_history(
    market_cap: Option<f64>,
    net_debt: &YearSeries,
    ebitda: &YearSeries,
) -> Vec<EvRow> {
    let mut years: Vec<i32> = ebitda.keys().chain(net_debt.keys()).copied().collect();
    years.sort_unstable();
    years.dedup();

    years
        .into_iter()
        .map(|year| {
            let ebitda = ebitda.get(&year).copied();
            let enterprise_value = market_cap
                .zip(net_debt.get(&year))
                .and_then(|(cap, nd)| finite(cap + nd));
            EvRow {
                year,
                ebitda,
                enterprise_value,
                ev_to_ebitda: enterprise_value
                    .zip(ebitda)
                    .and_then(|(ev, e)| ratio(ev, e)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use valora_data::{Frequency, PricePoint, StatementKind};

    fn balance() -> FinancialStatement {
        let mut bs = FinancialStatement::new(StatementKind::BalanceSheet);
        bs.insert(LineItem::LongTermDebt, 2022, 90.0);
        bs.insert(LineItem::LongTermDebt, 2023, 100.0);
        bs.insert(LineItem::CashAndCashEquivalents, 2022, 20.0);
        bs.insert(LineItem::CashAndCashEquivalents, 2023, 30.0);
        bs
    }

    #[test]
    fn test_net_debt_falls_back_to_long_term_debt() {
        let nd = net_debt(&balance());
        assert_eq!(nd.get(&2022), Some(&70.0));
        assert_eq!(nd.get(&2023), Some(&70.0));
    }

    #[test]
    fn test_net_debt_requires_cash() {
        let mut bs = FinancialStatement::new(StatementKind::BalanceSheet);
        bs.insert(LineItem::TotalDebt, 2023, 100.0);
        assert!(net_debt(&bs).is_empty());
    }

    #[test]
    fn test_net_debt_to_fcf() {
        let nd: YearSeries = [(2022, 70.0), (2023, 70.0)].into_iter().collect();
        let fcf: YearSeries = [(2022, 35.0), (2023, 0.0)].into_iter().collect();
        let ratio = net_debt_to_fcf(&nd, &fcf);
        assert_eq!(ratio.len(), 1);
        assert_relative_eq!(ratio[&2022], 2.0);
    }

    #[test]
    fn test_per_history_drops_zero_eps() {
        let prices = PriceHistory::new(
            "KO",
            Frequency::Daily,
            vec![
                PricePoint::new(NaiveDate::from_ymd_opt(2022, 12, 30).unwrap(), 60.0),
                PricePoint::new(NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(), 58.0),
            ],
        );
        let eps: YearSeries = [(2021, 2.0), (2022, 2.5), (2023, 0.0)].into_iter().collect();
        let rows = per_history(&eps, &prices);
        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].per.unwrap(), 24.0);
        assert!(rows[1].per.is_none());
    }

    #[test]
    fn test_ev_ebitda_current_uses_latest_balance_year() {
        let mut income = FinancialStatement::new(StatementKind::Income);
        income.insert(LineItem::Ebitda, 2022, 10.0);
        income.insert(LineItem::Ebitda, 2023, 20.0);
        let ev = ev_ebitda_current(Some(1_000.0), &balance(), &income).unwrap();
        assert_relative_eq!(ev, (1_000.0 + 100.0 - 30.0) / 20.0);
        assert!(ev_ebitda_current(None, &balance(), &income).is_none());
    }

    #[test]
    fn test_ev_ebitda_history() {
        let nd: YearSeries = [(2022, 70.0), (2023, 70.0)].into_iter().collect();
        let ebitda: YearSeries = [(2023, 50.0), (2024, 55.0)].into_iter().collect();
        let rows = ev_ebitda_history(Some(430.0), &nd, &ebitda);
        assert_eq!(rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2022, 2023, 2024]);
        assert!(rows[0].ev_to_ebitda.is_none());
        assert_relative_eq!(rows[1].ev_to_ebitda.unwrap(), 10.0);
        assert!(rows[2].enterprise_value.is_none());
    }
}
