//! Growth and price-target valuation.
//!
//! Rates are fractions throughout (`0.12` is 12%); only the growth-multiple
//! thresholds are stated in percentage points.

use crate::{finite, ratio};
use serde::{Deserialize, Serialize};
use valora_data::{CompanySnapshot, FinancialStatement, LineItem};

/// Projection horizon in years.
pub const PROJECTION_YEARS: i32 = 5;

/// Dividend yield as a fraction. Unavailable when either input is missing or zero.
pub fn current_yield(dividend: Option<f64>, price: Option<f64>) -> Option<f64> {
    let (dividend, price) = (dividend?, price?);
    if dividend == 0.0 {
        return None;
    }
    ratio(dividend, price)
}

/// Sustainable growth rate `G = ROE × (1 − payout)`.
pub fn growth_rate(roe: Option<f64>, payout: Option<f64>) -> Option<f64> {
    finite(roe? * (1.0 - payout?))
}

/// Multiple applied to projected earnings: 10 up to 10% growth, 15 up to
/// 20%, 20 above.
pub fn growth_multiple(growth: Option<f64>) -> Option<u32> {
    let percent = finite(growth? * 100.0)?;
    Some(if percent <= 10.0 {
        10
    } else if percent <= 20.0 {
        15
    } else {
        20
    })
}

/// EPS compounded at `growth` for `years`.
pub fn projected_eps(eps: Option<f64>, growth: Option<f64>, years: i32) -> Option<f64> {
    finite(eps? * (1.0 + growth?).powi(years))
}

/// Projected earnings times the growth multiple.
pub fn projected_price(projected_eps: Option<f64>, multiple: Option<u32>) -> Option<f64> {
    finite(projected_eps? * f64::from(multiple?))
}

/// Annual growth that takes `price` to `projected_price` in `years`.
pub fn implied_growth(projected_price: Option<f64>, price: Option<f64>, years: i32) -> Option<f64> {
    let growth = ratio(projected_price?, price?)?;
    if growth < 0.0 || years <= 0 {
        return None;
    }
    finite(growth.powf(1.0 / f64::from(years)) - 1.0)
}

/// `(total equity − preferred equity) / shares`.
pub fn book_value_per_share(
    total_equity: Option<f64>,
    preferred_equity: f64,
    shares: Option<f64>,
) -> Option<f64> {
    ratio(total_equity? - preferred_equity, shares?)
}

/// Price-to-book times book value per share.
pub fn book_fair_price(price_to_book: Option<f64>, book_per_share: Option<f64>) -> Option<f64> {
    finite(price_to_book? * book_per_share?)
}

/// Price at which next year's dividend (grown at `cagr`) yields `desired_yield`.
pub fn dividend_target_price(
    dividend: Option<f64>,
    cagr: Option<f64>,
    desired_yield: f64,
) -> Option<f64> {
    ratio(dividend? * (1.0 + cagr?), desired_yield)
}

/// Inputs of the growth valuation block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Current share price
    pub price: Option<f64>,
    /// Annual dividend per share
    pub dividend: Option<f64>,
    /// Payout ratio (fraction)
    pub payout_ratio: Option<f64>,
    /// Return on equity (fraction)
    pub return_on_equity: Option<f64>,
    /// Trailing EPS
    pub eps: Option<f64>,
    /// Price to book
    pub price_to_book: Option<f64>,
    /// Latest total equity
    pub total_equity: Option<f64>,
    /// Preferred equity, assumed zero
    pub preferred_equity: f64,
    /// Shares outstanding
    pub shares: Option<f64>,
    /// Dividend CAGR (fraction)
    pub dividend_cagr: Option<f64>,
    /// Target yield (fraction)
    pub desired_yield: f64,
}

impl ValuationInputs {
    /// Gather inputs from the snapshot and balance sheet.
    ///
    /// Shares come from the snapshot, falling back to the latest reported
    /// ordinary share count.
    pub fn from_sources(
        snapshot: &CompanySnapshot,
        balance: &FinancialStatement,
        dividend_cagr: Option<f64>,
        desired_yield: f64,
    ) -> Self {
        let shares = snapshot.shares_outstanding.or_else(|| {
            balance
                .latest(LineItem::OrdinarySharesNumber)
                .map(|(_, v)| v)
        });
        Self {
            price: snapshot.current_price,
            dividend: snapshot.dividend_rate,
            payout_ratio: snapshot.payout_ratio,
            return_on_equity: snapshot.return_on_equity,
            eps: snapshot.trailing_eps,
            price_to_book: snapshot.price_to_book,
            total_equity: balance.latest(LineItem::TotalEquity).map(|(_, v)| v),
            preferred_equity: 0.0,
            shares,
            dividend_cagr,
            desired_yield,
        }
    }
}

/// Projected valuation derived from [`ValuationInputs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthValuation {
    /// Current dividend yield (fraction)
    pub current_yield: Option<f64>,
    /// Sustainable growth G (fraction)
    pub growth_rate: Option<f64>,
    /// Growth multiple
    pub growth_multiple: Option<u32>,
    /// EPS in five years
    pub projected_eps: Option<f64>,
    /// Price in five years at the growth multiple
    pub projected_price: Option<f64>,
    /// Growth implied by the projected price (fraction)
    pub implied_growth: Option<f64>,
    /// Book value per share
    pub book_value_per_share: Option<f64>,
    /// Book-value fair price
    pub book_fair_price: Option<f64>,
    /// Price matching the desired yield
    pub dividend_target_price: Option<f64>,
}

impl GrowthValuation {
    /// Evaluate every formula; each one degrades independently.
    pub fn compute(inputs: &ValuationInputs) -> Self {
        let growth = growth_rate(inputs.return_on_equity, inputs.payout_ratio);
        let multiple = growth_multiple(growth);
        let eps5 = projected_eps(inputs.eps, growth, PROJECTION_YEARS);
        let price5 = projected_price(eps5, multiple);
        let bps = book_value_per_share(inputs.total_equity, inputs.preferred_equity, inputs.shares);

        Self {
            current_yield: current_yield(inputs.dividend, inputs.price),
            growth_rate: growth,
            growth_multiple: multiple,
            projected_eps: eps5,
            projected_price: price5,
            implied_growth: implied_growth(price5, inputs.price, PROJECTION_YEARS),
            book_value_per_share: bps,
            book_fair_price: book_fair_price(inputs.price_to_book, bps),
            dividend_target_price: dividend_target_price(
                inputs.dividend,
                inputs.dividend_cagr,
                inputs.desired_yield,
            ),
        }
    }
}
