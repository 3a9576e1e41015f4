//! Metric Registry
//!
//! Catalogue of every metric the dashboard reports, with the inputs each one
//! needs. Used for lookup and for the `metrics` listing.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Metric categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricCategory {
    /// Growth and price-target valuation
    Valuation,
    /// Dividend history and yield bands
    Dividend,
    /// Debt and market multiples
    Multiple,
    /// Price performance
    Return,
    /// Derived statement series
    Statement,
}

impl MetricCategory {
    /// All categories.
    pub const ALL: [Self; 5] = [
        Self::Valuation,
        Self::Dividend,
        Self::Multiple,
        Self::Return,
        Self::Statement,
    ];

    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Valuation => "valuation",
            Self::Dividend => "dividend",
            Self::Multiple => "multiple",
            Self::Return => "return",
            Self::Statement => "statement",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_suffix('s').unwrap_or(&normalized);
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| format!("Unknown metric category: {}", s))
    }
}

/// Metric metadata
#[derive(Debug, Clone)]
pub struct MetricInfo {
    /// Metric name (unique identifier)
    pub name: &'static str,
    /// Metric category
    pub category: MetricCategory,
    /// Brief description of the formula
    pub description: &'static str,
    /// Inputs the metric reads
    pub inputs: &'static [&'static str],
}

/// Get all available metric info
pub fn available_metrics() -> Vec<MetricInfo> {
    vec![
        // Valuation
        MetricInfo {
            name: "current_yield",
            category: MetricCategory::Valuation,
            description: "Annual dividend / current price",
            inputs: &["dividend_rate", "current_price"],
        },
        MetricInfo {
            name: "growth_rate",
            category: MetricCategory::Valuation,
            description: "Sustainable growth G = ROE x (1 - payout)",
            inputs: &["return_on_equity", "payout_ratio"],
        },
        MetricInfo {
            name: "growth_multiple",
            category: MetricCategory::Valuation,
            description: "10 if G <= 10%, 15 if G <= 20%, else 20",
            inputs: &["growth_rate"],
        },
        MetricInfo {
            name: "projected_eps",
            category: MetricCategory::Valuation,
            description: "EPS x (1 + G)^5",
            inputs: &["trailing_eps", "growth_rate"],
        },
        MetricInfo {
            name: "projected_price",
            category: MetricCategory::Valuation,
            description: "Five-year EPS x growth multiple",
            inputs: &["projected_eps", "growth_multiple"],
        },
        MetricInfo {
            name: "implied_growth",
            category: MetricCategory::Valuation,
            description: "(projected price / price)^(1/5) - 1",
            inputs: &["projected_price", "current_price"],
        },
        MetricInfo {
            name: "book_value_per_share",
            category: MetricCategory::Valuation,
            description: "(total equity - preferred equity) / shares outstanding",
            inputs: &["total_equity", "shares_outstanding"],
        },
        MetricInfo {
            name: "book_fair_price",
            category: MetricCategory::Valuation,
            description: "Price-to-book x book value per share",
            inputs: &["price_to_book", "book_value_per_share"],
        },
        MetricInfo {
            name: "dividend_target_price",
            category: MetricCategory::Valuation,
            description: "Dividend x (1 + CAGR) / desired yield",
            inputs: &["dividend_rate", "dividend_cagr", "desired_yield"],
        },
        // Dividends
        MetricInfo {
            name: "annual_dividends",
            category: MetricCategory::Dividend,
            description: "Calendar-year dividend totals within the price history",
            inputs: &["dividends", "prices"],
        },
        MetricInfo {
            name: "dividend_cagr",
            category: MetricCategory::Dividend,
            description: "Growth from the first to the last complete dividend year",
            inputs: &["annual_dividends"],
        },
        MetricInfo {
            name: "yield_history",
            category: MetricCategory::Dividend,
            description: "Annual dividend / close for each price point",
            inputs: &["annual_dividends", "prices"],
        },
        MetricInfo {
            name: "fcf_payout",
            category: MetricCategory::Dividend,
            description: "|Dividends paid| / free cash flow",
            inputs: &["free_cash_flow", "cash_dividends_paid"],
        },
        MetricInfo {
            name: "weiss_bands",
            category: MetricCategory::Dividend,
            description: "Geraldine Weiss over/undervalued prices from yield extremes",
            inputs: &["daily_prices", "dividends"],
        },
        // Multiples
        MetricInfo {
            name: "net_debt",
            category: MetricCategory::Multiple,
            description: "Total (or long-term) debt - cash",
            inputs: &["total_debt", "cash_and_cash_equivalents"],
        },
        MetricInfo {
            name: "net_debt_to_fcf",
            category: MetricCategory::Multiple,
            description: "Net debt / free cash flow",
            inputs: &["net_debt", "free_cash_flow"],
        },
        MetricInfo {
            name: "per_history",
            category: MetricCategory::Multiple,
            description: "Year-end close / basic EPS",
            inputs: &["basic_eps", "prices"],
        },
        MetricInfo {
            name: "ev_ebitda",
            category: MetricCategory::Multiple,
            description: "(Market cap + debt - cash) / EBITDA",
            inputs: &["market_cap", "net_debt", "ebitda"],
        },
        // Returns
        MetricInfo {
            name: "total_return",
            category: MetricCategory::Return,
            description: "Last close / first close - 1",
            inputs: &["prices"],
        },
        MetricInfo {
            name: "annualized_return",
            category: MetricCategory::Return,
            description: "Total growth compounded over days / 365.25 years",
            inputs: &["prices"],
        },
        MetricInfo {
            name: "drawdown",
            category: MetricCategory::Return,
            description: "Close / running maximum - 1",
            inputs: &["prices"],
        },
        // Statements
        MetricInfo {
            name: "margins",
            category: MetricCategory::Statement,
            description: "Gross, operating and net income over revenue",
            inputs: &["total_revenue", "gross_profit", "operating_income", "net_income"],
        },
        MetricInfo {
            name: "free_cash_flow_breakdown",
            category: MetricCategory::Statement,
            description: "Operating cash flow - |capex| and its share of operating cash flow",
            inputs: &["operating_cash_flow", "capital_expenditure"],
        },
        MetricInfo {
            name: "debt_issuance_trend",
            category: MetricCategory::Statement,
            description: "Least-squares trend of debt issuance",
            inputs: &["issuance_of_debt"],
        },
        MetricInfo {
            name: "shares_outstanding",
            category: MetricCategory::Statement,
            description: "Ordinary shares outstanding by year",
            inputs: &["ordinary_shares_number"],
        },
    ]
}

/// Get metrics by category
pub fn metrics_by_category(category: MetricCategory) -> Vec<MetricInfo> {
    available_metrics()
        .into_iter()
        .filter(|m| m.category == category)
        .collect()
}

/// Get metric info by name
pub fn get_metric_info(name: &str) -> Option<MetricInfo> {
    available_metrics().into_iter().find(|m| m.name == name)
}

/// Count metrics by category
pub fn count_by_category() -> HashMap<MetricCategory, usize> {
    let mut counts = HashMap::new();
    for metric in available_metrics() {
        *counts.entry(metric.category).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_metrics_count() {
        assert_eq!(available_metrics().len(), 25);
    }

    #[test]
    fn test_count_by_category() {
        let counts = count_by_category();
        assert_eq!(counts.get(&MetricCategory::Valuation), Some(&9));
        assert_eq!(counts.get(&MetricCategory::Dividend), Some(&5));
        assert_eq!(counts.get(&MetricCategory::Multiple), Some(&4));
        assert_eq!(counts.get(&MetricCategory::Return), Some(&3));
        assert_eq!(counts.get(&MetricCategory::Statement), Some(&4));
    }

    #[test]
    fn test_get_metric_info() {
        let cagr = get_metric_info("dividend_cagr").unwrap();
        assert_eq!(cagr.category, MetricCategory::Dividend);
        assert!(get_metric_info("nonexistent_metric").is_none());
    }

    #[test]
    fn test_names_unique_and_inputs_present() {
        let metrics = available_metrics();
        let mut names: Vec<_> = metrics.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metrics.len());
        for metric in metrics {
            assert!(!metric.inputs.is_empty(), "Metric {} has no inputs", metric.name);
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Dividends".parse::<MetricCategory>(), Ok(MetricCategory::Dividend));
        assert_eq!("valuation".parse::<MetricCategory>(), Ok(MetricCategory::Valuation));
        assert!("risk".parse::<MetricCategory>().is_err());
    }
}
