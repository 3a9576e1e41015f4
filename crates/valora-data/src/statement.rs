//! Annual financial statements.

use crate::series::YearSeries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The three annual statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementKind {
    /// Income statement
    Income,
    /// Balance sheet
    BalanceSheet,
    /// Cash flow statement
    CashFlow,
}

impl StatementKind {
    /// All statement kinds.
    pub const ALL: [Self; 3] = [Self::Income, Self::BalanceSheet, Self::CashFlow];

    /// Human-readable name.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Income => "income statement",
            Self::BalanceSheet => "balance sheet",
            Self::CashFlow => "cash flow statement",
        }
    }

    /// Line items that belong to this statement.
    pub fn line_items(&self) -> impl Iterator<Item = LineItem> + '_ {
        LineItem::ALL
            .into_iter()
            .filter(move |item| item.statement() == *self)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineItem {
    // Income statement
    /// Total revenue
    TotalRevenue,
    /// Gross profit
    GrossProfit,
    /// Operating income
    OperatingIncome,
    /// Net income
    NetIncome,
    /// Net income from continuing operations, net of minority interest
    NetIncomeContinuing,
    /// Basic earnings per share
    BasicEps,
    /// Diluted earnings per share
    DilutedEps,
    /// EBITDA
    Ebitda,

    // Balance sheet
    /// Total assets
    TotalAssets,
    /// Current assets
    CurrentAssets,
    /// Total liabilities net of minority interest
    TotalLiabilities,
    /// Current liabilities
    CurrentLiabilities,
    /// Total equity gross of minority interest
    TotalEquity,
    /// Total debt
    TotalDebt,
    /// Long-term debt
    LongTermDebt,
    /// Net debt as reported
    NetDebt,
    /// Cash and cash equivalents
    CashAndCashEquivalents,
    /// Cash (financial companies)
    CashFinancial,
    /// Ordinary shares outstanding
    OrdinarySharesNumber,

    // Cash flow
    /// Operating cash flow
    OperatingCashFlow,
    /// Capital expenditure (reported negative)
    CapitalExpenditure,
    /// Free cash flow as reported
    FreeCashFlow,
    /// Cash dividends paid (reported negative)
    CashDividendsPaid,
    /// Issuance of debt
    IssuanceOfDebt,
    /// Repayment of debt
    RepaymentOfDebt,
    /// Repurchase of capital stock
    RepurchaseOfCapitalStock,
}

impl LineItem {
    /// Every known line item.
    pub const ALL: [Self; 26] = [
        Self::TotalRevenue,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::NetIncome,
        Self::NetIncomeContinuing,
        Self::BasicEps,
        Self::DilutedEps,
        Self::Ebitda,
        Self::TotalAssets,
        Self::CurrentAssets,
        Self::TotalLiabilities,
        Self::CurrentLiabilities,
        Self::TotalEquity,
        Self::TotalDebt,
        Self::LongTermDebt,
        Self::NetDebt,
        Self::CashAndCashEquivalents,
        Self::CashFinancial,
        Self::OrdinarySharesNumber,
        Self::OperatingCashFlow,
        Self::CapitalExpenditure,
        Self::FreeCashFlow,
        Self::CashDividendsPaid,
        Self::IssuanceOfDebt,
        Self::RepaymentOfDebt,
        Self::RepurchaseOfCapitalStock,
    ];

    /// Provider field name, without the `annual` prefix.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::TotalRevenue => "TotalRevenue",
            Self::GrossProfit => "GrossProfit",
            Self::OperatingIncome => "OperatingIncome",
            Self::NetIncome => "NetIncome",
            Self::NetIncomeContinuing => "NetIncomeFromContinuingOperationNetMinorityInterest",
            Self::BasicEps => "BasicEPS",
            Self::DilutedEps => "DilutedEPS",
            Self::Ebitda => "EBITDA",
            Self::TotalAssets => "TotalAssets",
            Self::CurrentAssets => "CurrentAssets",
            Self::TotalLiabilities => "TotalLiabilitiesNetMinorityInterest",
            Self::CurrentLiabilities => "CurrentLiabilities",
            Self::TotalEquity => "TotalEquityGrossMinorityInterest",
            Self::TotalDebt => "TotalDebt",
            Self::LongTermDebt => "LongTermDebt",
            Self::NetDebt => "NetDebt",
            Self::CashAndCashEquivalents => "CashAndCashEquivalents",
            Self::CashFinancial => "CashFinancial",
            Self::OrdinarySharesNumber => "OrdinarySharesNumber",
            Self::OperatingCashFlow => "OperatingCashFlow",
            Self::CapitalExpenditure => "CapitalExpenditure",
            Self::FreeCashFlow => "FreeCashFlow",
            Self::CashDividendsPaid => "CashDividendsPaid",
            Self::IssuanceOfDebt => "IssuanceOfDebt",
            Self::RepaymentOfDebt => "RepaymentOfDebt",
            Self::RepurchaseOfCapitalStock => "RepurchaseOfCapitalStock",
        }
    }

    /// Display label, as printed in statements.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TotalRevenue => "Total Revenue",
            Self::GrossProfit => "Gross Profit",
            Self::OperatingIncome => "Operating Income",
            Self::NetIncome => "Net Income",
            Self::NetIncomeContinuing => {
                "Net Income from Continuing Operation Net Minority Interest"
            }
            Self::BasicEps => "Basic EPS",
            Self::DilutedEps => "Diluted EPS",
            Self::Ebitda => "EBITDA",
            Self::TotalAssets => "Total Assets",
            Self::CurrentAssets => "Current Assets",
            Self::TotalLiabilities => "Total Liabilities Net Minority Interest",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::TotalEquity => "Total Equity Gross Minority Interest",
            Self::TotalDebt => "Total Debt",
            Self::LongTermDebt => "Long Term Debt",
            Self::NetDebt => "Net Debt",
            Self::CashAndCashEquivalents => "Cash And Cash Equivalents",
            Self::CashFinancial => "Cash Financial",
            Self::OrdinarySharesNumber => "Ordinary Shares Number",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::CapitalExpenditure => "Capital Expenditure",
            Self::FreeCashFlow => "Free Cash Flow",
            Self::CashDividendsPaid => "Cash Dividends Paid",
            Self::IssuanceOfDebt => "Issuance Of Debt",
            Self::RepaymentOfDebt => "Repayment Of Debt",
            Self::RepurchaseOfCapitalStock => "Repurchase Of Capital Stock",
        }
    }

    /// Statement the line is reported on.
    pub const fn statement(&self) -> StatementKind {
        match self {
            Self::TotalRevenue
            | Self::GrossProfit
            | Self::OperatingIncome
            | Self::NetIncome
            | Self::NetIncomeContinuing
            | Self::BasicEps
            | Self::DilutedEps
            | Self::Ebitda => StatementKind::Income,
            Self::TotalAssets
            | Self::CurrentAssets
            | Self::TotalLiabilities
            | Self::CurrentLiabilities
            | Self::TotalEquity
            | Self::TotalDebt
            | Self::LongTermDebt
            | Self::NetDebt
            | Self::CashAndCashEquivalents
            | Self::CashFinancial
            | Self::OrdinarySharesNumber => StatementKind::BalanceSheet,
            Self::OperatingCashFlow
            | Self::CapitalExpenditure
            | Self::FreeCashFlow
            | Self::CashDividendsPaid
            | Self::IssuanceOfDebt
            | Self::RepaymentOfDebt
            | Self::RepurchaseOfCapitalStock => StatementKind::CashFlow,
        }
    }

    /// Look up a line by provider field name, with or without the `annual` prefix.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.strip_prefix("annual").unwrap_or(key);
        Self::ALL.into_iter().find(|item| item.key() == key)
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One annual statement: line item by fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    /// Which statement this is
    pub kind: StatementKind,
    /// Reported lines
    pub lines: BTreeMap<LineItem, YearSeries>,
}

impl FinancialStatement {
    /// Create an empty statement.
    pub const fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            lines: BTreeMap::new(),
        }
    }

    /// Record a value. Non-finite values are ignored.
    pub fn insert(&mut self, item: LineItem, year: i32, value: f64) {
        if value.is_finite() {
            self.lines.entry(item).or_default().insert(year, value);
        }
    }

    /// Whether no line has any value.
    pub fn is_empty(&self) -> bool {
        self.lines.values().all(|series| series.is_empty())
    }

    /// Whether the line is present with at least one value.
    pub fn has(&self, item: LineItem) -> bool {
        self.get(item).is_some()
    }

    /// Series for a line, if reported.
    pub fn get(&self, item: LineItem) -> Option<&YearSeries> {
        self.lines.get(&item).filter(|series| !series.is_empty())
    }

    /// First reported series among `items`.
    pub fn first_of(&self, items: &[LineItem]) -> Option<&YearSeries> {
        items.iter().find_map(|item| self.get(*item))
    }

    /// Value for a line in a fiscal year.
    pub fn value(&self, item: LineItem, year: i32) -> Option<f64> {
        self.get(item)?.get(&year).copied()
    }

    /// Most recent (year, value) for a line.
    pub fn latest(&self, item: LineItem) -> Option<(i32, f64)> {
        self.get(item)?
            .iter()
            .next_back()
            .map(|(year, value)| (*year, *value))
    }

    /// Every fiscal year with at least one value.
    pub fn years(&self) -> BTreeSet<i32> {
        self.lines
            .values()
            .flat_map(|series| series.keys().copied())
            .collect()
    }

    /// Most recent fiscal year with any value.
    pub fn latest_year(&self) -> Option<i32> {
        self.years().into_iter().next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_keys_round_trip() {
        for item in LineItem::ALL {
            assert_eq!(LineItem::from_key(item.key()), Some(item));
            let prefixed = format!("annual{}", item.key());
            assert_eq!(LineItem::from_key(&prefixed), Some(item));
        }
        assert_eq!(LineItem::from_key("annualSomethingElse"), None);
    }

    #[test]
    fn test_statement_partition() {
        let total: usize = StatementKind::ALL
            .iter()
            .map(|kind| kind.line_items().count())
            .sum();
        assert_eq!(total, LineItem::ALL.len());
        assert!(
            StatementKind::CashFlow
                .line_items()
                .any(|item| item == LineItem::FreeCashFlow)
        );
    }

    #[test]
    fn test_statement_accessors() {
        let mut bs = FinancialStatement::new(StatementKind::BalanceSheet);
        bs.insert(LineItem::TotalDebt, 2022, 100.0);
        bs.insert(LineItem::TotalDebt, 2023, 120.0);
        bs.insert(LineItem::CashFinancial, 2023, 30.0);
        bs.insert(LineItem::NetDebt, 2023, f64::NAN);

        assert!(!bs.is_empty());
        assert!(!bs.has(LineItem::NetDebt));
        assert_eq!(bs.latest(LineItem::TotalDebt), Some((2023, 120.0)));
        assert_eq!(bs.value(LineItem::TotalDebt, 2022), Some(100.0));
        assert_eq!(
            bs.first_of(&[LineItem::CashAndCashEquivalents, LineItem::CashFinancial])
                .and_then(|s| s.get(&2023)),
            Some(&30.0)
        );
        assert_eq!(bs.latest_year(), Some(2023));
    }
}
