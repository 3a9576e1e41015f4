//! Price returns and drawdown.

use crate::{finite, ratio};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use valora_data::PriceHistory;

/// Days per year used to annualize.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// `last / first − 1` over the whole history.
pub fn total_return(prices: &PriceHistory) -> Option<f64> {
    let (first, last) = (prices.first()?, prices.last()?);
    finite(ratio(last.close, first.close)? - 1.0)
}

/// Compound annual return with `years = days / 365.25`.
pub fn annualized_return(prices: &PriceHistory) -> Option<f64> {
    let (first, last) = (prices.first()?, prices.last()?);
    let days = (last.date - first.date).num_days();
    if days <= 0 {
        return None;
    }
    let growth = ratio(last.close, first.close)?;
    if growth < 0.0 {
        return None;
    }
    finite(growth.powf(DAYS_PER_YEAR / days as f64) - 1.0)
}

/// Distance below the running maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    /// Observation date
    pub date: NaiveDate,
    /// `close / running max − 1`, zero or negative
    pub drawdown: f64,
}

/// Drawdown of every point.
pub fn drawdown(prices: &PriceHistory) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    prices
        .points
        .iter()
        .filter_map(|p| {
            peak = peak.max(p.close);
            Some(DrawdownPoint {
                date: p.date,
                drawdown: finite(ratio(p.close, peak)? - 1.0)?,
            })
        })
        .collect()
}

/// Deepest drawdown, if any.
pub fn max_drawdown(points: &[DrawdownPoint]) -> Option<f64> {
    points.iter().map(|p| p.drawdown).reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use valora_data::{Frequency, PricePoint};

    fn history(points: &[(i32, u32, u32, f64)]) -> PriceHistory {
        PriceHistory::new(
            "KO",
            Frequency::Daily,
            points
                .iter()
                .map(|(y, m, d, c)| PricePoint::new(NaiveDate::from_ymd_opt(*y, *m, *d).unwrap(), *c))
                .collect(),
        )
    }

    #[test]
    fn test_total_and_annualized_return() {
        let prices = history(&[(2020, 1, 1, 100.0), (2022, 1, 1, 121.0)]);
        assert_relative_eq!(total_return(&prices).unwrap(), 0.21, epsilon = 1e-12);

        // 731 days is 2.0014 years
        let expected = 1.21_f64.powf(365.25 / 731.0) - 1.0;
        assert_relative_eq!(annualized_return(&prices).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_returns_unavailable() {
        let single = history(&[(2020, 1, 1, 100.0)]);
        assert_relative_eq!(total_return(&single).unwrap(), 0.0);
        assert!(annualized_return(&single).is_none());

        let zero_start = history(&[(2020, 1, 1, 0.0), (2021, 1, 1, 10.0)]);
        assert!(total_return(&zero_start).is_none());
    }

    #[test]
    fn test_drawdown() {
        let prices = history(&[
            (2020, 1, 1, 100.0),
            (2020, 1, 2, 120.0),
            (2020, 1, 3, 90.0),
            (2020, 1, 4, 130.0),
        ]);
        let dd = drawdown(&prices);
        let values: Vec<f64> = dd.iter().map(|p| p.drawdown).collect();
        assert_relative_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.0);
        assert_relative_eq!(values[2], -0.25, epsilon = 1e-12);
        assert_relative_eq!(values[3], 0.0);
        assert!(values.iter().all(|v| *v <= 0.0));
        assert_relative_eq!(max_drawdown(&dd).unwrap(), -0.25, epsilon = 1e-12);
    }
}
