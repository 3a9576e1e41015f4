#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valora/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dashboard;
pub mod export;
pub mod format;
pub mod render;
pub mod report;

pub use dashboard::{
    Axis, Block, Chart, Dashboard, DashboardBuilder, MetricTile, Notice, NoticeLevel,
    ReferenceLine, Section, Series, SeriesKind, Table,
};
pub use export::{ExportError, ExportFormat, Exporter, export_dashboard};
pub use format::{NOT_AVAILABLE, ValueFormat};
pub use report::{OutputFormat, ReportError};
