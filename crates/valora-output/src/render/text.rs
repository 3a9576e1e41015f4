//! Plain-text rendering for the terminal.

use super::{downsample, series_summary, x_span};
use crate::dashboard::{Block, Chart, Dashboard, MetricTile, NoticeLevel, Table};
use std::fmt::Write;

const WIDTH: usize = 80;
const SPARK_WIDTH: usize = 48;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the whole dashboard.
pub fn render(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));
    let _ = writeln!(out, "{} ({})", dashboard.title, dashboard.symbol);
    if let Some(subtitle) = &dashboard.subtitle {
        let _ = writeln!(out, "{}", subtitle);
    }
    let _ = writeln!(out, "Generated {}", dashboard.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));

    for section in &dashboard.sections {
        let _ = writeln!(out, "\n{}", section.title);
        let _ = writeln!(out, "{}", "-".repeat(section.title.chars().count().max(3)));
        for block in &section.blocks {
            match block {
                Block::Heading { text } => {
                    let _ = writeln!(out, "\n  {}", text);
                }
                Block::Metrics { tiles } => out.push_str(&tiles_text(tiles)),
                Block::Table(table) => out.push_str(&table_text(table)),
                Block::Chart(chart) => out.push_str(&chart_text(chart)),
                Block::Notice(notice) => {
                    let marker = match notice.level {
                        NoticeLevel::Info => "i",
                        NoticeLevel::Warning => "!",
                    };
                    let _ = writeln!(out, "  [{}] {}", marker, notice.message);
                }
            }
        }
    }
    out
}

fn tiles_text(tiles: &[MetricTile]) -> String {
    let label_width = tiles
        .iter()
        .map(|t| t.label.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for tile in tiles {
        let _ = writeln!(out, "  {:<width$}  {}", tile.label, tile.value, width = label_width);
    }
    out
}

/// Boxed table with right-aligned cells after the first column.
pub fn table_text(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("  +");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };
    let format_row = |cells: &[String]| {
        let mut line = String::from("  |");
        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
            if i == 0 {
                let _ = write!(line, " {:<width$} |", cell, width = width);
            } else {
                let _ = write!(line, " {:>width$} |", cell, width = width);
            }
        }
        line
    };

    let mut out = String::new();
    let _ = writeln!(out, "\n  {}", table.title);
    let _ = writeln!(out, "{}", border);
    let _ = writeln!(out, "{}", format_row(&table.columns));
    let _ = writeln!(out, "{}", border);
    for row in &table.rows {
        let _ = writeln!(out, "{}", format_row(row));
    }
    let _ = writeln!(out, "{}", border);
    out
}

/// Sparkline of `values` scaled between their own extremes.
pub fn sparkline(values: &[Option<f64>]) -> String {
    let present = values.iter().flatten().copied().filter(|v| v.is_finite());
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    values
        .iter()
        .map(|value| match value {
            Some(v) if v.is_finite() => {
                let level = if hi > lo {
                    ((v - lo) / (hi - lo) * (SPARKS.len() - 1) as f64).round() as usize
                } else {
                    SPARKS.len() / 2
                };
                SPARKS[level.min(SPARKS.len() - 1)]
            }
            _ => ' ',
        })
        .collect()
}

fn chart_text(chart: &Chart) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n  {} [{}]", chart.title, x_span(chart));
    let name_width = chart
        .series
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0);
    for series in &chart.series {
        let [name, first, last, min, max] = series_summary(series);
        let _ = writeln!(
            out,
            "  {:<nw$}  {}  first {}  last {}  min {}  max {}",
            name,
            sparkline(&downsample(&series.values, SPARK_WIDTH)),
            first,
            last,
            min,
            max,
            nw = name_width
        );
    }
    for line in &chart.reference_lines {
        let _ = writeln!(out, "  -- {}: {:.2}", line.label, line.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardBuilder, Section, Series};
    use crate::format::ValueFormat;

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(sparkline(&[Some(0.0), Some(7.0), None, Some(3.5)]), "▁█ ▅");
        assert_eq!(sparkline(&[Some(1.0), Some(1.0)]), "▅▅");
    }

    #[test]
    fn test_table_text_is_boxed() {
        let table = Table::new("Dividends", ["Year", "Dividend"])
            .with_row(["2023", "$1.84"])
            .with_row(["2024", "$1.94"]);
        let text = table_text(&table);
        assert!(text.contains("+------+----------+"));
        assert!(text.contains("| 2023 |    $1.84 |"));
    }

    #[test]
    fn test_render_contains_all_blocks() {
        let mut section = Section::new("Key data");
        section
            .metrics(vec![MetricTile::new("Price", "$60.22")])
            .chart(
                Chart::new("Price history", vec!["2023-01-03".into(), "2023-12-29".into()])
                    .with_series(Series::line(
                        "Close",
                        ValueFormat::Money,
                        vec![Some(61.0), Some(58.9)],
                    )),
            )
            .warning("'EBITDA' not found in the income statement");
        let dashboard = DashboardBuilder::new()
            .symbol("KO")
            .title("The Coca-Cola Company")
            .section(section)
            .build();

        let text = render(&dashboard);
        assert!(text.contains("The Coca-Cola Company (KO)"));
        assert!(text.contains("Price  $60.22"));
        assert!(text.contains("2023-01-03 to 2023-12-29"));
        assert!(text.contains("[!] 'EBITDA' not found"));
    }
}
