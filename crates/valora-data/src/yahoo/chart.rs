//! Price history and dividend events from the chart endpoint.

use crate::error::{DataError, Result};
use crate::series::{DateRange, DividendEvent, Frequency, PriceHistory, PricePoint};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use urlencoding::encode;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Closing prices plus the dividends paid over the same window.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Closing prices
    pub history: PriceHistory,
    /// Dividend events in ascending date order
    pub dividends: Vec<DividendEvent>,
    /// Trading currency reported by the provider
    pub currency: Option<String>,
}

/// Chart request URL.
pub fn chart_url(symbol: &str, range: &DateRange, frequency: Frequency) -> String {
    format!(
        "{}/{}?period1={}&period2={}&interval={}&events=div&includeAdjustedClose=true",
        CHART_BASE_URL,
        encode(symbol),
        range.period1(),
        range.period2(),
        frequency.interval()
    )
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    events: Option<ChartEvents>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, RawDividend>,
}

#[derive(Debug, Deserialize)]
struct RawDividend {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parse a chart response body.
///
/// Adjusted closes are preferred over raw closes. Rows with no close are
/// dropped. Timestamps are shifted by the exchange offset before taking the
/// calendar date.
pub fn parse_chart(symbol: &str, frequency: Frequency, body: &str) -> Result<Chart> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        let reason = error
            .description
            .or(error.code)
            .unwrap_or_else(|| "unknown chart error".to_string());
        return Err(DataError::missing(symbol, reason));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DataError::missing(symbol, "No chart result returned"))?;

    let offset = result.meta.gmtoffset;
    let closes = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|block| block.adjclose)
        .filter(|values| values.len() == result.timestamp.len())
        .or_else(|| {
            result
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|block| block.close)
        })
        .unwrap_or_default();

    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| Some(PricePoint::new(local_date(*ts, offset)?, close?)))
        .collect();

    let mut dividends: Vec<DividendEvent> = result
        .events
        .map(|events| events.dividends.into_values().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter(|d| d.amount.is_finite())
        .filter_map(|d| Some(DividendEvent::new(local_date(d.date, offset)?, d.amount)))
        .collect();
    dividends.sort_by_key(|d| d.date);

    Ok(Chart {
        history: PriceHistory::new(symbol, frequency, points),
        dividends,
        currency: result.meta.currency,
    })
}

fn local_date(timestamp: i64, offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + offset, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "KO", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "events": {"dividends": {
                    "1710423000": {"amount": 0.485, "date": 1710423000},
                    "1701959400": {"amount": 0.46, "date": 1701959400}
                }},
                "indicators": {
                    "quote": [{"close": [59.5, null, 60.1]}],
                    "adjclose": [{"adjclose": [58.0, null, 58.6]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_prefers_adjusted_close() {
        let chart = parse_chart("KO", Frequency::Daily, BODY).unwrap();
        assert_eq!(chart.history.len(), 2);
        assert_eq!(chart.history.first().unwrap().close, 58.0);
        assert_eq!(
            chart.history.first().unwrap().date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(chart.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_parse_chart_sorts_dividends() {
        let chart = parse_chart("KO", Frequency::Daily, BODY).unwrap();
        let amounts: Vec<f64> = chart.dividends.iter().map(|d| d.amount).collect();
        assert_eq!(amounts, vec![0.46, 0.485]);
    }

    #[test]
    fn test_parse_chart_error_is_missing_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("ZZZZ", Frequency::Daily, body).unwrap_err();
        assert!(err.is_missing_data());
    }

    #[test]
    fn test_chart_url() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        let url = chart_url("BRK-B", &range, Frequency::Monthly);
        assert!(url.contains("/chart/BRK-B?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153600"));
        assert!(url.contains("interval=1mo"));
    }
}
