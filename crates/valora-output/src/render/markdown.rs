//! Markdown rendering.
//!
//! Charts have no Markdown equivalent, so each one is summarized as a table
//! of first, last, minimum and maximum values per series.

use super::{series_summary, x_span};
use crate::dashboard::{Block, Chart, Dashboard, MetricTile, NoticeLevel, Table};
use std::fmt::Write;

/// Render the whole dashboard.
pub fn render(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} ({})\n", dashboard.title, dashboard.symbol);
    if let Some(subtitle) = &dashboard.subtitle {
        let _ = writeln!(out, "**{}**\n", subtitle);
    }
    let _ = writeln!(
        out,
        "_Generated {}_\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    for section in &dashboard.sections {
        let _ = writeln!(out, "## {}\n", section.title);
        for block in &section.blocks {
            match block {
                Block::Heading { text } => {
                    let _ = writeln!(out, "### {}\n", text);
                }
                Block::Metrics { tiles } => out.push_str(&tiles_markdown(tiles)),
                Block::Table(table) => out.push_str(&table_markdown(table)),
                Block::Chart(chart) => out.push_str(&chart_markdown(chart)),
                Block::Notice(notice) => {
                    let prefix = match notice.level {
                        NoticeLevel::Info => "",
                        NoticeLevel::Warning => "**Warning:** ",
                    };
                    let _ = writeln!(out, "> {}{}\n", prefix, notice.message);
                }
            }
        }
    }
    out
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|c| escape(c)).collect();
    format!("| {} |\n", escaped.join(" | "))
}

fn tiles_markdown(tiles: &[MetricTile]) -> String {
    let mut out = String::from("| Metric | Value |\n|--------|------:|\n");
    for tile in tiles {
        out.push_str(&row(&[tile.label.clone(), tile.value.clone()]));
    }
    out.push('\n');
    out
}

/// Markdown table with a bold title line.
pub fn table_markdown(table: &Table) -> String {
    let mut out = format!("**{}**\n\n", table.title);
    out.push_str(&row(&table.columns));
    let separators: Vec<&str> = (0..table.columns.len())
        .map(|i| if i == 0 { "---" } else { "---:" })
        .collect();
    let _ = writeln!(out, "| {} |", separators.join(" | "));
    for cells in &table.rows {
        out.push_str(&row(cells));
    }
    out.push('\n');
    out
}

fn chart_markdown(chart: &Chart) -> String {
    let mut out = format!("**{}** ({})\n\n", chart.title, x_span(chart));
    out.push_str("| Series | First | Last | Min | Max |\n|---|---:|---:|---:|---:|\n");
    for series in &chart.series {
        out.push_str(&row(&series_summary(series)));
    }
    for line in &chart.reference_lines {
        let _ = writeln!(out, "| {} (reference) | | {:.2} | | |", escape(&line.label), line.value);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardBuilder, Section, Series};
    use crate::format::ValueFormat;

    #[test]
    fn test_table_markdown() {
        let table = Table::new("Debt | FCF", ["Year", "Net debt"]).with_row(["2023", "$35,000"]);
        let md = table_markdown(&table);
        assert!(md.starts_with("**Debt | FCF**"));
        assert!(md.contains("| Year | Net debt |\n| --- | ---: |\n| 2023 | $35,000 |"));
    }

    #[test]
    fn test_render_sections_and_notices() {
        let mut section = Section::new("Multiples");
        section
            .info("Current PER is 24.30x")
            .warning("EV/EBITDA not available")
            .chart(
                Chart::new("PER", vec!["2022".into(), "2023".into()])
                    .with_series(Series::bar("PER", ValueFormat::Multiple, vec![Some(26.0), Some(24.3)]))
                    .with_reference_line("Average", Some(25.15)),
            );
        let dashboard = DashboardBuilder::new().symbol("KO").section(section).build();

        let md = render(&dashboard);
        assert!(md.starts_with("# KO (KO)"));
        assert!(md.contains("## Multiples"));
        assert!(md.contains("> Current PER is 24.30x"));
        assert!(md.contains("> **Warning:** EV/EBITDA not available"));
        assert!(md.contains("| PER | 26.00x | 24.30x | 24.30x | 26.00x |"));
        assert!(md.contains("Average (reference)"));
    }
}
