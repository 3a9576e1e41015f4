//! Dashboard model.
//!
//! A [`Dashboard`] is an ordered list of [`Section`]s, each holding blocks of
//! metric tiles, tables, charts and notices. Renderers and exporters consume
//! this model; nothing in it knows where the numbers came from.

use crate::format::ValueFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A labelled value shown as a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTile {
    /// Tile label
    pub label: String,
    /// Formatted value, `N/A` when unavailable
    pub value: String,
}

impl MetricTile {
    /// Create a tile from an already formatted value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create a tile by formatting `value`.
    pub fn formatted(label: impl Into<String>, value: Option<f64>, format: ValueFormat) -> Self {
        Self::new(label, format.apply(value))
    }
}

/// A table of formatted cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Title, also used to name exported files
    pub title: String,
    /// Column headers
    pub columns: Vec<String>,
    /// Rows, one cell per column
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(title: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded and long rows truncated to the
    /// column count.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Builder form of [`Table::push_row`].
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Connected line
    Line,
    /// One bar per x value
    Bar,
}

/// Which y axis a series is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left axis
    #[default]
    Primary,
    /// Right axis
    Secondary,
}

/// One plotted series, aligned with the chart's x labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Legend name
    pub name: String,
    /// Drawing style
    pub kind: SeriesKind,
    /// Y axis
    pub axis: Axis,
    /// Display format of the values
    pub format: ValueFormat,
    /// One value per x label; gaps are `None`
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// A line on the primary axis.
    pub fn line(name: impl Into<String>, format: ValueFormat, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Line,
            axis: Axis::Primary,
            format,
            values,
        }
    }

    /// Bars on the primary axis.
    pub fn bar(name: impl Into<String>, format: ValueFormat, values: Vec<Option<f64>>) -> Self {
        Self {
            kind: SeriesKind::Bar,
            ..Self::line(name, format, values)
        }
    }

    /// Move the series to the secondary axis.
    pub const fn secondary(mut self) -> Self {
        self.axis = Axis::Secondary;
        self
    }

    /// Values that are present and finite.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied().filter(|v| v.is_finite())
    }

    /// Last present value.
    pub fn last_value(&self) -> Option<f64> {
        self.values
            .iter()
            .rev()
            .flatten()
            .copied()
            .find(|v| v.is_finite())
    }

    /// Smallest and largest present value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.present().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Horizontal reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    /// Label
    pub label: String,
    /// Y value on the primary axis
    pub value: f64,
}

/// A chart over shared x labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Title, also used to name exported files
    pub title: String,
    /// X axis labels (dates or years)
    pub x: Vec<String>,
    /// Plotted series
    pub series: Vec<Series>,
    /// Horizontal reference lines
    pub reference_lines: Vec<ReferenceLine>,
}

impl Chart {
    /// Create a chart with no series.
    pub fn new(title: impl Into<String>, x: Vec<String>) -> Self {
        Self {
            title: title.into(),
            x,
            series: Vec::new(),
            reference_lines: Vec::new(),
        }
    }

    /// Add a series. Its values are padded or truncated to the x labels.
    pub fn with_series(mut self, mut series: Series) -> Self {
        series.values.resize(self.x.len(), None);
        self.series.push(series);
        self
    }

    /// Add a horizontal reference line; non-finite values are skipped.
    pub fn with_reference_line(mut self, label: impl Into<String>, value: Option<f64>) -> Self {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.reference_lines.push(ReferenceLine {
                label: label.into(),
                value,
            });
        }
        self
    }

    /// Whether there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.series.iter().all(|s| s.present().next().is_none())
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational caption
    Info,
    /// Something could not be shown
    Warning,
}

/// A message shown in place of, or next to, content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text
    pub message: String,
}

/// Content of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Sub-heading
    Heading {
        /// Heading text
        text: String,
    },
    /// Row of metric tiles
    Metrics {
        /// Tiles in display order
        tiles: Vec<MetricTile>,
    },
    /// Table
    Table(Table),
    /// Chart
    Chart(Chart),
    /// Caption or warning
    Notice(Notice),
}

/// A titled group of blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Section title
    pub title: String,
    /// Blocks in display order
    pub blocks: Vec<Block>,
}

impl Section {
    /// Create an empty section.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Add a sub-heading.
    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading { text: text.into() });
        self
    }

    /// Add a row of tiles.
    pub fn metrics(&mut self, tiles: Vec<MetricTile>) -> &mut Self {
        self.blocks.push(Block::Metrics { tiles });
        self
    }

    /// Add a table, or a warning naming it when it has no rows.
    pub fn table(&mut self, table: Table) -> &mut Self {
        if table.is_empty() {
            let message = format!("No data available for '{}'", table.title);
            return self.warning(message);
        }
        self.blocks.push(Block::Table(table));
        self
    }

    /// Add a chart, or a warning naming it when it has nothing to plot.
    pub fn chart(&mut self, chart: Chart) -> &mut Self {
        if chart.is_empty() {
            let message = format!("No data available for '{}'", chart.title);
            return self.warning(message);
        }
        self.blocks.push(Block::Chart(chart));
        self
    }

    /// Add an informational caption.
    pub fn info(&mut self, message: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Notice(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }));
        self
    }

    /// Add a warning.
    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Notice(Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }));
        self
    }

    /// Tables in this section.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Charts in this section.
    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(c) => Some(c),
            _ => None,
        })
    }

    /// Warnings in this section.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Notice(Notice {
                level: NoticeLevel::Warning,
                message,
            }) => Some(message.as_str()),
            _ => None,
        })
    }
}

/// A complete dashboard for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Ticker symbol
    pub symbol: String,
    /// Headline, usually the company name
    pub title: String,
    /// Secondary line (sector, industry)
    pub subtitle: Option<String>,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Sections in display order
    pub sections: Vec<Section>,
}

impl Dashboard {
    /// Find a section by title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Every table, in display order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.sections.iter().flat_map(Section::tables)
    }

    /// Every chart, in display order.
    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.sections.iter().flat_map(Section::charts)
    }
}

/// Builder for [`Dashboard`].
#[derive(Debug, Default)]
pub struct DashboardBuilder {
    symbol: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    generated_at: Option<DateTime<Utc>>,
    sections: Vec<Section>,
}

impl DashboardBuilder {
    /// Create a new dashboard builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol.
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the headline.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the secondary line.
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the timestamp; defaults to now.
    pub const fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Append a section.
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Build the dashboard. The title defaults to the symbol.
    pub fn build(self) -> Dashboard {
        let symbol = self.symbol.unwrap_or_default();
        Dashboard {
            title: self.title.unwrap_or_else(|| symbol.clone()),
            symbol,
            subtitle: self.subtitle,
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            sections: self.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_columns() {
        let table = Table::new("Annual dividends", ["Year", "Dividend"])
            .with_row(["2023"])
            .with_row(["2024", "$1.94", "extra"]);
        assert_eq!(table.rows[0], vec!["2023".to_string(), String::new()]);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn test_empty_blocks_become_warnings() {
        let mut section = Section::new("Balance");
        section
            .table(Table::new("Assets", ["Year"]))
            .chart(Chart::new("Equity", vec!["2023".into()]).with_series(Series::bar(
                "Equity",
                ValueFormat::MoneyLarge,
                vec![None],
            )));
        let warnings: Vec<_> = section.warnings().collect();
        assert_eq!(warnings, vec!["No data available for 'Assets'", "No data available for 'Equity'"]);
        assert_eq!(section.tables().count(), 0);
    }

    #[test]
    fn test_chart_series_aligned_to_x() {
        let chart = Chart::new("Price", vec!["a".into(), "b".into(), "c".into()])
            .with_series(Series::line("Close", ValueFormat::Money, vec![Some(1.0)]))
            .with_reference_line("Average", Some(2.0))
            .with_reference_line("Missing", None);
        assert_eq!(chart.series[0].values, vec![Some(1.0), None, None]);
        assert_eq!(chart.reference_lines.len(), 1);
        assert_eq!(chart.series[0].bounds(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_builder_defaults_title_to_symbol() {
        let dashboard = DashboardBuilder::new()
            .symbol("KO")
            .section(Section::new("Key data"))
            .build();
        assert_eq!(dashboard.title, "KO");
        assert!(dashboard.section("Key data").is_some());
    }
}
