//! Display formatting for dashboard values.
//!
//! Every formatter takes an optional value and prints [`NOT_AVAILABLE`] for
//! a missing or non-finite one.

use serde::{Deserialize, Serialize};

/// Placeholder for a metric that could not be computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// How a numeric value is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// `$12.34`
    Money,
    /// `$1,234,567`
    MoneyLarge,
    /// Fraction shown as `12.34%`
    Percent,
    /// Already in percent, shown as `12.34%`
    PercentPoints,
    /// `15.20x`
    Multiple,
    /// `1.23`
    Ratio,
    /// `4,300,000,000`
    Count,
}

impl ValueFormat {
    /// Format `value`.
    pub fn apply(self, value: Option<f64>) -> String {
        match self {
            Self::Money => money(value),
            Self::MoneyLarge => money_large(value),
            Self::Percent => percent(value),
            Self::PercentPoints => percent_points(value),
            Self::Multiple => multiple(value),
            Self::Ratio => ratio(value),
            Self::Count => count(value),
        }
    }
}

fn available(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// `$12.34`
pub fn money(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${:.2}", v))
}

/// `$1,234,567`
pub fn money_large(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${}", thousands(v, 0)))
}

/// Fraction as a percentage: `0.1234` prints `12.34%`.
pub fn percent(value: Option<f64>) -> String {
    percent_points(value.map(|v| v * 100.0))
}

/// Percentage value: `12.34` prints `12.34%`.
pub fn percent_points(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}%", v))
}

/// `15.20x`
pub fn multiple(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}x", v))
}

/// Plain two-decimal number.
pub fn ratio(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}", v))
}

/// Whole number with thousands separators.
pub fn count(value: Option<f64>) -> String {
    available(value).map_or_else(|| NOT_AVAILABLE.to_string(), |v| thousands(v, 0))
}

/// `value` with `decimals` decimals and `,` between thousands.
pub fn thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}
