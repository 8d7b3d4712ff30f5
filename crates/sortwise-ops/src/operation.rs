//! Placement decisions and per-file outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conflict::ConflictKind;

/// Why a file was left where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Duplicate content and the duplicate policy is `skip`.
    Duplicate,
    /// Destination taken and the conflict policy is `skip`.
    Conflict { conflict: ConflictKind },
    /// The file already sits at its destination.
    AlreadyInPlace,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::Conflict { conflict } => write!(f, "conflict: {conflict}"),
            Self::AlreadyInPlace => write!(f, "already in place"),
        }
    }
}

/// What should happen to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Move or copy to `destination`, replacing an existing file if `overwrite`.
    Transfer { destination: PathBuf, overwrite: bool },
    /// Leave the file alone.
    Skip {
        reason: SkipReason,
        destination: Option<PathBuf>,
    },
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Moved,
    Copied,
    Skipped { reason: SkipReason },
    Failed { message: String },
}

impl Action {
    /// Check if the file was placed (or would be, in a dry run).
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Moved | Self::Copied)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moved => write!(f, "moved"),
            Self::Copied => write!(f, "copied"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Per-file record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    /// Selected category; `None` when unclassified.
    pub category: Option<String>,
    pub score: f64,
    pub confidence: f64,
    /// First-seen file with the same content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<PathBuf>,
    pub size: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl FileOutcome {
    /// Outcome for a file that failed before reaching the mover.
    pub fn failed(source: PathBuf, size: u64, message: impl Into<String>) -> Self {
        Self {
            source,
            destination: None,
            category: None,
            score: 0.0,
            confidence: 0.0,
            duplicate_of: None,
            size,
            action: Action::Failed {
                message: message.into(),
            },
        }
    }
}

/// Filesystem failure while placing a file.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace {path}: {source}")]
    RemoveExisting {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to transfer {from} to {to}: {source}")]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copied to {to} but failed to remove {from}: {source}")]
    RemoveSource {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
