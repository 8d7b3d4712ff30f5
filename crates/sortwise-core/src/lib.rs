//! Core types and configuration for sortwise.
//!
//! This crate provides the data model shared by every stage of an
//! organizer run: discovered files, the typed YAML configuration,
//! compiled classification rules and the per-run counters.

mod candidate;
mod config;
mod error;
mod rule;
mod stats;

pub use candidate::{ContentHash, FileCandidate, Timestamps};
pub use config::{
    ClassificationConfig, ConflictPolicy, DuplicatePolicy, FilterConfig, LogRotation,
    LoggingConfig, OrganizationConfig, OrganizerConfig, ReportConfig, ReportFormat, ScanConfig,
    ScanConfigBuilder, SubBucket, TransferMode,
};
pub use error::{ConfigError, ScanError, ScanWarning, WarningKind};
pub use rule::{
    AgeBasis, ClassificationRule, RuleConfig, RuleSet, Signal, SignalConfig, SignalKind,
    SignalMatcher,
};
pub use stats::RunStatistics;
