//! Dashboard renderers.

pub mod html;
pub mod markdown;
pub mod text;

use crate::dashboard::{Chart, Series};
use crate::format::NOT_AVAILABLE;

/// Summary row of one series: name, first, last, min, max.
pub(crate) fn series_summary(series: &Series) -> [String; 5] {
    let first = series.present().next();
    let (min, max) = series.bounds().unzip();
    [
        series.name.clone(),
        series.format.apply(first),
        series.format.apply(series.last_value()),
        series.format.apply(min),
        series.format.apply(max),
    ]
}

/// First and last x label, for chart captions.
pub(crate) fn x_span(chart: &Chart) -> String {
    match (chart.x.first(), chart.x.last()) {
        (Some(first), Some(last)) if first != last => format!("{} to {}", first, last),
        (Some(only), _) => only.clone(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Reduce `values` to at most `width` buckets, keeping the last value of
/// each bucket.
pub(crate) fn downsample(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    if width == 0 || values.len() <= width {
        return values.to_vec();
    }
    (0..width)
        .map(|bucket| {
            let start = bucket * values.len() / width;
            let end = (bucket + 1) * values.len() / width;
            values[start..end]
                .iter()
                .rev()
                .flatten()
                .copied()
                .find(|v| v.is_finite())
        })
        .collect()
}
