//! Company snapshot from the quoteSummary endpoint.

use crate::error::{DataError, Result};
use crate::snapshot::CompanySnapshot;
use serde::Deserialize;
use urlencoding::encode;

const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Modules requested for a snapshot.
const MODULES: &str = "price,summaryProfile,summaryDetail,financialData,defaultKeyStatistics";

/// quoteSummary request URL (without crumb).
pub fn summary_url(symbol: &str) -> String {
    format!("{}/{}?modules={}", SUMMARY_BASE_URL, encode(symbol), MODULES)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
    financial_data: Option<FinancialDataModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
}

/// `{raw, fmt}` value; empty objects mean "not available".
#[derive(Debug, Default, Clone, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: Option<&RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailModule {
    dividend_rate: Option<RawValue>,
    payout_ratio: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    market_cap: Option<RawValue>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    current_price: Option<RawValue>,
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    trailing_eps: Option<RawValue>,
    price_to_book: Option<RawValue>,
    shares_outstanding: Option<RawValue>,
}

/// Parse a quoteSummary response body into a snapshot.
pub fn parse_summary(symbol: &str, body: &str) -> Result<CompanySnapshot> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.quote_summary.error {
        return Err(DataError::missing(
            symbol,
            error
                .description
                .unwrap_or_else(|| "quoteSummary error".to_string()),
        ));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DataError::missing(symbol, "No quote summary returned"))?;

    let price = result.price.unwrap_or_default();
    let profile = result.summary_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    Ok(CompanySnapshot {
        symbol: symbol.to_string(),
        long_name: price.long_name.or(price.short_name),
        sector: profile.sector,
        industry: profile.industry,
        currency: price.currency.or(detail.currency),
        current_price: raw(financial.current_price.as_ref())
            .or_else(|| raw(price.regular_market_price.as_ref())),
        dividend_rate: raw(detail.dividend_rate.as_ref()),
        payout_ratio: raw(detail.payout_ratio.as_ref()),
        trailing_pe: raw(detail.trailing_pe.as_ref()),
        return_on_equity: raw(financial.return_on_equity.as_ref()),
        trailing_eps: raw(stats.trailing_eps.as_ref()),
        price_to_book: raw(stats.price_to_book.as_ref()),
        market_cap: raw(detail.market_cap.as_ref()).or_else(|| raw(price.market_cap.as_ref())),
        shares_outstanding: raw(stats.shares_outstanding.as_ref()),
    })
}
