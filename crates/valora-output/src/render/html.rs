//! Self-contained HTML page with inline SVG charts.

use super::x_span;
use crate::dashboard::{Axis, Block, Chart, Dashboard, MetricTile, NoticeLevel, SeriesKind, Table};
use html_escape::encode_text;
use std::fmt::Write;

const CHART_WIDTH: f64 = 760.0;
const CHART_HEIGHT: f64 = 280.0;
const MARGIN: f64 = 48.0;
const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:860px;margin:2rem auto;color:#222}\
h1{margin-bottom:0}.sub{color:#666}section{margin-top:2rem;border-top:1px solid #ddd}\
.tiles{display:flex;flex-wrap:wrap;gap:.75rem}.tile{border:1px solid #ddd;border-radius:6px;padding:.5rem .75rem}\
.tile .label{font-size:.8rem;color:#666}.tile .value{font-size:1.2rem;font-weight:600}\
table{border-collapse:collapse;margin:.5rem 0}td,th{border:1px solid #ddd;padding:.25rem .5rem}\
td+td,th+th{text-align:right}.info{color:#135}.warning{color:#a40}svg{background:#fafafa}";

/// Render the whole dashboard.
pub fn render(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} ({symbol})</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title} ({symbol})</h1>\n",
        title = encode_text(&dashboard.title),
        symbol = encode_text(&dashboard.symbol),
    );
    if let Some(subtitle) = &dashboard.subtitle {
        let _ = writeln!(out, "<p class=\"sub\">{}</p>", encode_text(subtitle));
    }
    let _ = writeln!(
        out,
        "<p class=\"sub\">Generated {}</p>",
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    for section in &dashboard.sections {
        let _ = writeln!(out, "<section>\n<h2>{}</h2>", encode_text(&section.title));
        for block in &section.blocks {
            match block {
                Block::Heading { text } => {
                    let _ = writeln!(out, "<h3>{}</h3>", encode_text(text));
                }
                Block::Metrics { tiles } => out.push_str(&tiles_html(tiles)),
                Block::Table(table) => out.push_str(&table_html(table)),
                Block::Chart(chart) => out.push_str(&chart_svg(chart)),
                Block::Notice(notice) => {
                    let class = match notice.level {
                        NoticeLevel::Info => "info",
                        NoticeLevel::Warning => "warning",
                    };
                    let _ = writeln!(out, "<p class=\"{}\">{}</p>", class, encode_text(&notice.message));
                }
            }
        }
        out.push_str("</section>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn tiles_html(tiles: &[MetricTile]) -> String {
    let mut out = String::from("<div class=\"tiles\">\n");
    for tile in tiles {
        let _ = writeln!(
            out,
            "<div class=\"tile\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            encode_text(&tile.label),
            encode_text(&tile.value)
        );
    }
    out.push_str("</div>\n");
    out
}

fn table_html(table: &Table) -> String {
    let mut out = format!("<table>\n<caption>{}</caption>\n<tr>", encode_text(&table.title));
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", encode_text(column));
    }
    out.push_str("</tr>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", encode_text(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

/// Value range of one axis, widened to include zero for bar series and
/// padded when flat.
fn axis_range(chart: &Chart, axis: Axis) -> Option<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = None;
    let mut has_bars = false;
    for series in chart.series.iter().filter(|s| s.axis == axis) {
        has_bars |= series.kind == SeriesKind::Bar;
        if let Some((lo, hi)) = series.bounds() {
            bounds = Some(bounds.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
        }
    }
    if axis == Axis::Primary {
        for line in &chart.reference_lines {
            bounds = Some(bounds.map_or((line.value, line.value), |(a, b)| {
                (a.min(line.value), b.max(line.value))
            }));
        }
    }
    let (mut lo, mut hi) = bounds?;
    if has_bars {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if hi <= lo {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        lo -= pad;
        hi += pad;
    }
    Some((lo, hi))
}

/// Inline SVG of a chart: bars and polylines over shared x slots, with
/// dashed reference lines.
pub fn chart_svg(chart: &Chart) -> String {
    let n = chart.x.len().max(1);
    let plot_width = CHART_WIDTH - 2.0 * MARGIN;
    let plot_height = CHART_HEIGHT - 2.0 * MARGIN;
    let slot = plot_width / n as f64;
    let x_at = |i: usize| MARGIN + slot * (i as f64 + 0.5);
    let primary = axis_range(chart, Axis::Primary);
    let secondary = axis_range(chart, Axis::Secondary);
    let y_at = |value: f64, (lo, hi): (f64, f64)| {
        CHART_HEIGHT - MARGIN - (value - lo) / (hi - lo) * plot_height
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<figure>\n<figcaption>{} ({})</figcaption>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        encode_text(&chart.title),
        encode_text(&x_span(chart)),
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
    );
    let _ = writeln!(
        out,
        "<line x1=\"{m}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#999\"/>",
        m = MARGIN,
        b = CHART_HEIGHT - MARGIN,
        r = CHART_WIDTH - MARGIN
    );
    if let Some((lo, hi)) = primary {
        let _ = writeln!(
            out,
            "<text x=\"4\" y=\"{:.1}\" font-size=\"10\">{:.2}</text>\n<text x=\"4\" y=\"{:.1}\" font-size=\"10\">{:.2}</text>",
            MARGIN,
            hi,
            CHART_HEIGHT - MARGIN,
            lo
        );
    }

    let bar_series: Vec<usize> = chart
        .series
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SeriesKind::Bar)
        .map(|(i, _)| i)
        .collect();
    let bar_width = slot * 0.8 / bar_series.len().max(1) as f64;

    for (index, series) in chart.series.iter().enumerate() {
        let colour = PALETTE[index % PALETTE.len()];
        let Some(range) = (match series.axis {
            Axis::Primary => primary,
            Axis::Secondary => secondary,
        }) else {
            continue;
        };
        match series.kind {
            SeriesKind::Bar => {
                let offset = bar_series.iter().position(|i| *i == index).unwrap_or(0);
                let zero = y_at(0.0_f64.clamp(range.0, range.1), range);
                for (i, value) in series.values.iter().enumerate() {
                    let Some(value) = value.filter(|v| v.is_finite()) else {
                        continue;
                    };
                    let y = y_at(value, range);
                    let x = MARGIN + slot * i as f64 + slot * 0.1 + bar_width * offset as f64;
                    let _ = writeln!(
                        out,
                        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {}</title></rect>",
                        x,
                        y.min(zero),
                        bar_width,
                        (zero - y).abs(),
                        colour,
                        encode_text(&chart.x[i]),
                        encode_text(&series.format.apply(Some(value)))
                    );
                }
            }
            SeriesKind::Line => {
                // gaps split the polyline
                let mut segments: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
                for (i, value) in series.values.iter().enumerate() {
                    match value.filter(|v| v.is_finite()) {
                        Some(v) => {
                            if let Some(segment) = segments.last_mut() {
                                segment.push((x_at(i), y_at(v, range)));
                            }
                        }
                        None => segments.push(Vec::new()),
                    }
                }
                for segment in segments.iter().filter(|s| !s.is_empty()) {
                    let points: Vec<String> = segment
                        .iter()
                        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
                        .collect();
                    let _ = writeln!(
                        out,
                        "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" points=\"{}\"/>",
                        colour,
                        points.join(" ")
                    );
                }
            }
        }
    }

    if let Some(range) = primary {
        for line in &chart.reference_lines {
            let y = y_at(line.value, range);
            let _ = writeln!(
                out,
                "<line x1=\"{m}\" y1=\"{y:.1}\" x2=\"{r}\" y2=\"{y:.1}\" stroke=\"#555\" stroke-dasharray=\"4 3\"/>\
                 <text x=\"{r}\" y=\"{ty:.1}\" font-size=\"10\" text-anchor=\"end\">{label}: {value:.2}</text>",
                m = MARGIN,
                r = CHART_WIDTH - MARGIN,
                y = y,
                ty = y - 3.0,
                label = encode_text(&line.label),
                value = line.value
            );
        }
    }

    // legend
    for (index, series) in chart.series.iter().enumerate() {
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{}\">{}{}</text>",
            MARGIN + 130.0 * index as f64,
            CHART_HEIGHT - 12.0,
            PALETTE[index % PALETTE.len()],
            encode_text(&series.name),
            if series.axis == Axis::Secondary { " (right)" } else { "" }
        );
    }
    out.push_str("</svg>\n</figure>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardBuilder, Section, Series};
    use crate::format::ValueFormat;

    fn chart() -> Chart {
        Chart::new("Debt <evolution>", vec!["2022".into(), "2023".into(), "2024".into()])
            .with_series(Series::bar(
                "Net debt",
                ValueFormat::MoneyLarge,
                vec![Some(30.0), Some(-10.0), Some(20.0)],
            ))
            .with_series(
                Series::line("Net debt / FCF", ValueFormat::Ratio, vec![Some(3.0), None, Some(2.0)])
                    .secondary(),
            )
            .with_reference_line("Average", Some(13.3))
    }

    #[test]
    fn test_chart_text_is_escaped() {
        let mut chart = chart();
        chart.title = "P&L <net>".to_string();
        let svg = chart_svg(&chart);
        assert!(svg.contains("P&amp;L &lt;net&gt;"));
        assert!(!svg.contains("<net>"));
    }

    #[test]
    fn test_axis_range_includes_zero_for_bars() {
        assert_eq!(axis_range(&chart(), Axis::Primary), Some((-10.0, 30.0)));
        assert_eq!(axis_range(&chart(), Axis::Secondary), Some((2.0, 3.0)));
    }

    #[test]
    fn test_chart_svg_elements() {
        let svg = chart_svg(&chart());
        assert_eq!(svg.matches("<rect").count(), 3);
        // the gap splits the line into two single-point segments
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("Debt &lt;evolution&gt;"));
        assert!(svg.contains("Net debt / FCF (right)"));
    }

    #[test]
    fn test_render_page() {
        let mut section = Section::new("Multiples");
        section.chart(chart()).warning("PER <unavailable>");
        let html = render(
            &DashboardBuilder::new()
                .symbol("KO")
                .title("Coca-Cola")
                .subtitle("Consumer Defensive | Beverages")
                .section(section)
                .build(),
        );
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Coca-Cola (KO)</h1>"));
        assert!(html.contains("<p class=\"warning\">PER &lt;unavailable&gt;</p>"));
        assert!(html.ends_with("</html>\n"));
    }
}
