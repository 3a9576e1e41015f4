//! Parsing of recorded provider responses.

use chrono::NaiveDate;
use valora_data::series::Frequency;
use valora_data::statement::{LineItem, StatementKind};
use valora_data::yahoo::{parse_chart, parse_statement, parse_summary};

#[test]
fn test_monthly_chart_fixture() {
    let body = include_str!("fixtures/chart_monthly.json");
    let chart = parse_chart("KO", Frequency::Monthly, body).unwrap();

    assert_eq!(chart.history.len(), 6);
    assert_eq!(chart.history.frequency, Frequency::Monthly);
    assert_eq!(
        chart.history.first().unwrap().date,
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    );
    assert_eq!(chart.history.last_close(), Some(58.12));
    assert_eq!(chart.dividends.len(), 2);
    assert!(chart.dividends.iter().all(|d| d.amount == 0.46));
}

#[test]
fn test_quote_summary_fixture() {
    let body = include_str!("fixtures/quote_summary.json");
    let snapshot = parse_summary("KO", body).unwrap();

    assert_eq!(snapshot.long_name.as_deref(), Some("The Coca-Cola Company"));
    assert_eq!(snapshot.industry.as_deref(), Some("Beverages - Non-Alcoholic"));
    assert_eq!(snapshot.current_price, Some(60.22));
    assert_eq!(snapshot.payout_ratio, Some(0.7344));
    assert_eq!(snapshot.shares_outstanding, Some(4_323_000_000.0));
}

#[test]
fn test_cash_flow_fixture() {
    let body = include_str!("fixtures/timeseries_cash_flow.json");
    let cf = parse_statement("KO", StatementKind::CashFlow, body).unwrap();

    let fcf = cf.get(LineItem::FreeCashFlow).unwrap();
    assert_eq!(fcf.keys().copied().collect::<Vec<_>>(), vec![2021, 2022, 2023]);
    assert_eq!(cf.value(LineItem::CashDividendsPaid, 2023), Some(-7_952_000_000.0));
    assert!(!cf.has(LineItem::IssuanceOfDebt));
    assert!(!cf.has(LineItem::TotalAssets));
}
