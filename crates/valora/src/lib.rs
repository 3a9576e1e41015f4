#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valora/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod request;

// Re-export main types from sub-crates
pub use valora_data as data;
pub use valora_metrics as metrics;
pub use valora_output as output;

pub use request::{AnalysisRequest, DEFAULT_DESIRED_YIELD, MIN_DESIRED_YIELD, RequestError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
