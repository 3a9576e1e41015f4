//! Rendering a dashboard into its output formats.

use crate::dashboard::Dashboard;
use crate::render;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown output format name.
    #[error("Unknown output format: {0} (expected text, markdown, html or json)")]
    UnknownFormat(String),
}

/// Output format of a rendered dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Terminal text
    #[default]
    Text,
    /// Markdown document
    Markdown,
    /// Standalone HTML page with SVG charts
    Html,
    /// The dashboard model as JSON
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

impl Dashboard {
    /// Render in `format`.
    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        Ok(match format {
            OutputFormat::Text => render::text::render(self),
            OutputFormat::Markdown => render::markdown::render(self),
            OutputFormat::Html => render::html::render(self),
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Render in `format` and write the result to `path`.
    pub fn write_to(&self, path: &Path, format: OutputFormat) -> Result<(), ReportError> {
        let content = self.render(format)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardBuilder, Section};
    use rstest::rstest;

    #[rstest]
    #[case("text", OutputFormat::Text)]
    #[case("MD", OutputFormat::Markdown)]
    #[case(" html ", OutputFormat::Html)]
    #[case("json", OutputFormat::Json)]
    fn test_format_parse(#[case] input: &str, #[case] expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            "pdf".parse::<OutputFormat>(),
            Err(ReportError::UnknownFormat(name)) if name == "pdf"
        ));
    }

    #[test]
    fn test_json_round_trips_model() {
        let dashboard = DashboardBuilder::new()
            .symbol("KO")
            .section(Section::new("Key data"))
            .build();
        let json = dashboard.render(OutputFormat::Json).unwrap();
        let parsed: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dashboard);
    }
}
