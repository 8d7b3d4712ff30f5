//! Error types for organizer runs.

use std::path::PathBuf;

use thiserror::Error;

use sortwise_core::{ConfigError, ScanError};

/// Failure that stops a run or its report.
///
/// Per-file problems never surface here; they are recorded as outcomes.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
