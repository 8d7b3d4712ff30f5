//! Organizer runs for sortwise.
//!
//! An [`OrganizerRun`] wires the stages together for one pass over a source
//! tree: scan, classify, check for duplicates, place, and finally produce a
//! [`RunReport`] that the [`Reporter`] renders as text or JSON.
//!
//! ```rust,ignore
//! use sortwise_core::OrganizerConfig;
//! use sortwise_organize::{OrganizerRun, Reporter, RunOptions};
//!
//! let config = OrganizerConfig::load("organizer.yaml")?;
//! let report = OrganizerRun::new(&config, RunOptions::dry_run())?.run()?;
//! println!("{}", Reporter::from_config(&config.report).render(&report)?);
//! ```

mod error;
mod report;
mod run;

pub use error::OrganizeError;
pub use report::{Reporter, RunReport};
pub use run::{OrganizerRun, RunOptions};

// Re-export the types a report carries
pub use sortwise_core::{ReportFormat, RunStatistics, ScanWarning};
pub use sortwise_ops::{Action, FileOutcome, SkipReason};
