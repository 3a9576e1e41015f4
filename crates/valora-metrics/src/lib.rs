#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valora/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dividends;
pub mod multiples;
pub mod registry;
pub mod returns;
pub mod statements;
pub mod valuation;
pub mod weiss;

pub use registry::{
    MetricCategory, MetricInfo, available_metrics, get_metric_info, metrics_by_category,
};

/// `Some(value)` when finite.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Guarded division: unavailable for a zero denominator or a non-finite result.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}
