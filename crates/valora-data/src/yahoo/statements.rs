//! Annual statements from the fundamentals-timeseries endpoint.

use crate::error::{DataError, Result};
use crate::statement::{FinancialStatement, LineItem, StatementKind};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use urlencoding::encode;

const TIMESERIES_BASE_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Start of the statement window (2016-12-31 UTC); the provider only keeps
/// about five fiscal years of annual data anyway.
pub const STATEMENTS_PERIOD1: i64 = 1_483_142_400;

/// Timeseries request URL for one statement.
pub fn statement_url(symbol: &str, kind: StatementKind, period2: i64) -> String {
    let types: Vec<String> = kind
        .line_items()
        .map(|item| format!("annual{}", item.key()))
        .collect();
    format!(
        "{}/{}?symbol={}&type={}&period1={}&period2={}",
        TIMESERIES_BASE_URL,
        encode(symbol),
        encode(symbol),
        types.join(","),
        STATEMENTS_PERIOD1,
        period2
    )
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    result: Option<Vec<TimeseriesEntry>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEntry {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    values: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: String,
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// Parse a timeseries response body into a statement of `kind`.
///
/// Each value is filed under the calendar year of its `asOfDate`. Types
/// that belong to another statement are ignored.
pub fn parse_statement(symbol: &str, kind: StatementKind, body: &str) -> Result<FinancialStatement> {
    let envelope: TimeseriesEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.timeseries.error.filter(|e| !e.is_null()) {
        return Err(DataError::missing(symbol, format!("timeseries error: {}", error)));
    }

    let mut statement = FinancialStatement::new(kind);
    for entry in envelope.timeseries.result.unwrap_or_default() {
        for type_name in &entry.meta.types {
            let Some(item) = LineItem::from_key(type_name) else {
                continue;
            };
            if item.statement() != kind {
                continue;
            }
            let Some(raw_points) = entry.values.get(type_name) else {
                continue;
            };

            let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(raw_points.clone())?;
            for point in points.into_iter().flatten() {
                let date = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d")
                    .map_err(|e| DataError::Parse(format!("Invalid asOfDate '{}': {}", point.as_of_date, e)))?;
                if let Some(value) = point.reported_value.and_then(|v| v.raw) {
                    statement.insert(item, date.year(), value);
                }
            }
        }
    }

    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"timeseries":{"result":[
        {"meta":{"symbol":["KO"],"type":["annualTotalDebt"]},
         "timestamp":[1672444800,1703980800],
         "annualTotalDebt":[
            {"dataId":20100,"asOfDate":"2022-12-31","periodType":"12M","currencyCode":"USD",
             "reportedValue":{"raw":39149000000,"fmt":"39.15B"}},
            {"dataId":20100,"asOfDate":"2023-12-31","periodType":"12M","currencyCode":"USD",
             "reportedValue":{"raw":42064000000,"fmt":"42.06B"}}
         ]},
        {"meta":{"symbol":["KO"],"type":["annualNetDebt"]},
         "timestamp":[1703980800],
         "annualNetDebt":[null,
            {"dataId":20101,"asOfDate":"2023-12-31","periodType":"12M","currencyCode":"USD",
             "reportedValue":{"raw":32100000000,"fmt":"32.10B"}}]},
        {"meta":{"symbol":["KO"],"type":["annualCashFinancial"]}},
        {"meta":{"symbol":["KO"],"type":["annualTotalRevenue"]},
         "annualTotalRevenue":[{"asOfDate":"2023-12-31","reportedValue":{"raw":45754000000}}]}
    ],"error":null}}"#;

    #[test]
    fn test_parse_statement_files_values_by_year() {
        let bs = parse_statement("KO", StatementKind::BalanceSheet, BODY).unwrap();
        assert_eq!(bs.value(LineItem::TotalDebt, 2022), Some(39_149_000_000.0));
        assert_eq!(bs.value(LineItem::TotalDebt, 2023), Some(42_064_000_000.0));
        assert_eq!(bs.latest(LineItem::NetDebt), Some((2023, 32_100_000_000.0)));
        assert!(!bs.has(LineItem::CashFinancial));
    }

    #[test]
    fn test_parse_statement_ignores_other_statements() {
        let bs = parse_statement("KO", StatementKind::BalanceSheet, BODY).unwrap();
        assert!(!bs.has(LineItem::TotalRevenue));

        let income = parse_statement("KO", StatementKind::Income, BODY).unwrap();
        assert_eq!(income.value(LineItem::TotalRevenue, 2023), Some(45_754_000_000.0));
    }

    #[test]
    fn test_parse_statement_empty_result() {
        let body = r#"{"timeseries":{"result":[],"error":null}}"#;
        let cf = parse_statement("KO", StatementKind::CashFlow, body).unwrap();
        assert!(cf.is_empty());
    }

    #[test]
    fn test_statement_url_lists_all_lines() {
        let url = statement_url("KO", StatementKind::CashFlow, 1_704_067_200);
        assert!(url.contains("annualFreeCashFlow"));
        assert!(url.contains("annualRepurchaseOfCapitalStock"));
        assert!(!url.contains("annualTotalAssets"));
        assert!(url.ends_with("period2=1704067200"));
    }
}
