//! Closed-form properties of the valuation formulas.

use approx::assert_relative_eq;
use rstest::rstest;
use valora_data::YearSeries;
use valora_metrics::dividends::dividend_cagr;
use valora_metrics::valuation::{
    GrowthValuation, PROJECTION_YEARS, ValuationInputs, current_yield, dividend_target_price,
    growth_multiple, growth_rate, implied_growth, projected_eps,
};
use valora_metrics::{get_metric_info, ratio};

#[rstest]
#[case(1.84, 60.22)]
#[case(0.01, 1.0)]
#[case(12.5, 310.0)]
#[case(4.0, 0.5)]
fn test_yield_is_dividend_over_price(#[case] dividend: f64, #[case] price: f64) {
    let percent = current_yield(Some(dividend), Some(price)).unwrap() * 100.0;
    assert_relative_eq!(percent, dividend / price * 100.0, max_relative = 1e-12);
}

#[test]
fn test_growth_and_multiple_from_roe_and_payout() {
    let g = growth_rate(Some(0.20), Some(0.40)).unwrap();
    assert_relative_eq!(g, 0.12, epsilon = 1e-12);
    assert_eq!(growth_multiple(Some(g)), Some(15));
}

#[test]
fn test_five_year_eps() {
    let eps5 = projected_eps(Some(2.0), Some(0.12), PROJECTION_YEARS).unwrap();
    assert_relative_eq!(eps5, 3.524, epsilon = 1e-3);
}

#[test]
fn test_dividend_cagr_ten_percent() {
    let annual: YearSeries = [(2020, 1.00), (2021, 1.10), (2022, 1.21), (2023, 0.30)]
        .into_iter()
        .collect();
    let cagr = dividend_cagr(&annual).unwrap();
    assert_relative_eq!(cagr.rate, 0.10, epsilon = 1e-12);
    assert_eq!(cagr.years(), 2);
}

#[rstest]
#[case(Some(1.0), Some(0.0))]
#[case(Some(1.0), None)]
#[case(None, Some(10.0))]
fn test_missing_or_zero_denominator_is_unavailable(
    #[case] numerator: Option<f64>,
    #[case] denominator: Option<f64>,
) {
    assert!(current_yield(numerator, denominator).is_none());
    assert!(implied_growth(numerator, denominator, PROJECTION_YEARS).is_none());
}

#[test]
fn test_zero_desired_yield_is_unavailable() {
    assert!(dividend_target_price(Some(2.0), Some(0.05), 0.0).is_none());
    assert!(ratio(0.0, 0.0).is_none());
}

#[test]
fn test_valuation_block_with_no_inputs() {
    let valuation = GrowthValuation::compute(&ValuationInputs::default());
    assert_eq!(valuation, GrowthValuation::default());
}

#[test]
fn test_every_valuation_formula_is_registered() {
    for name in [
        "current_yield",
        "growth_rate",
        "growth_multiple",
        "projected_eps",
        "implied_growth",
        "dividend_cagr",
        "weiss_bands",
        "ev_ebitda",
    ] {
        assert!(get_metric_info(name).is_some(), "{} missing from registry", name);
    }
}
