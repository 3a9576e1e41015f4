//! CSV and JSON export of dashboard tables and chart data.
//!
//! Tables are exported as their formatted cells; charts as the raw values of
//! every series against the x labels.

use crate::dashboard::{Chart, Dashboard, Table};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Table {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(&self.columns)?;
                for row in &self.rows {
                    wtr.write_record(row)?;
                }
                finish(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Chart {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["x".to_string()];
                header.extend(self.series.iter().map(|s| s.name.clone()));
                wtr.write_record(&header)?;
                for (i, x) in self.x.iter().enumerate() {
                    let mut record = vec![x.clone()];
                    record.extend(self.series.iter().map(|s| {
                        s.values
                            .get(i)
                            .copied()
                            .flatten()
                            .filter(|v| v.is_finite())
                            .map(|v| v.to_string())
                            .unwrap_or_default()
                    }));
                    wtr.write_record(&record)?;
                }
                finish(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Dashboard {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Err(ExportError::InvalidFormat(
                "a dashboard has no single CSV form; export its tables and charts".to_string(),
            )),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Lowercase file-name stem: alphanumerics kept, runs of anything else
/// collapsed to `_`.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Write every table and chart of `dashboard` into `dir`, one file each,
/// named `<symbol>_<title>.<ext>`. Returns the written paths.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub fn export_dashboard(
    dashboard: &Dashboard,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;
    let symbol = slug(&dashboard.symbol);
    let mut written = Vec::new();
    let mut used = std::collections::HashSet::new();

    let mut write = |title: &str, item: &dyn Exporter| -> Result<(), ExportError> {
        let stem = format!("{}_{}", symbol, slug(title));
        let mut name = stem.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}_{}", stem, n);
            n += 1;
        }
        let path = dir.join(format!("{}.{}", name, format.extension()));
        item.export_to_file(&path, format)?;
        written.push(path);
        Ok(())
    };

    for table in dashboard.tables() {
        write(&table.title, table)?;
    }
    for chart in dashboard.charts() {
        write(&chart.title, chart)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Series;
    use crate::format::ValueFormat;
    use rstest::rstest;

    #[rstest]
    #[case("Annual dividends", "annual_dividends")]
    #[case("EV / EBITDA (history)", "ev_ebitda_history")]
    #[case("  --PER--  ", "per")]
    #[case("BRK.B", "brk_b")]
    fn test_slug(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slug(title), expected);
    }

    #[test]
    fn test_table_csv() {
        let table = Table::new("Dividends", ["Year", "Dividend"])
            .with_row(["2023", "$1.84"])
            .with_row(["2024", "$1,940"]);
        let csv = table.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "Year,Dividend\n2023,$1.84\n2024,\"$1,940\"\n");
    }

    #[test]
    fn test_chart_csv_uses_raw_values() {
        let chart = Chart::new("Yield", vec!["2023-01-31".into(), "2023-02-28".into()])
            .with_series(Series::line("Yield", ValueFormat::Percent, vec![Some(0.031), None]));
        let csv = chart.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "x,Yield\n2023-01-31,0.031\n2023-02-28,\n");
    }

    #[test]
    fn test_dashboard_csv_is_rejected() {
        let dashboard = crate::dashboard::DashboardBuilder::new().symbol("KO").build();
        assert!(matches!(
            dashboard.export_to_string(ExportFormat::Csv),
            Err(ExportError::InvalidFormat(_))
        ));
        assert!(dashboard.export_to_string(ExportFormat::PrettyJson).unwrap().contains("\"KO\""));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
