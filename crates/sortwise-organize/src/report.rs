//! Run reports and their rendering.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use sortwise_core::{ReportConfig, ReportFormat, RunStatistics, ScanWarning};
use sortwise_ops::{Action, FileOutcome};

use crate::error::OrganizeError;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub dry_run: bool,
    pub statistics: RunStatistics,
    pub outcomes: Vec<FileOutcome>,
    /// Entries the scanner could not read.
    pub warnings: Vec<ScanWarning>,
}

/// Renders a [`RunReport`] as text or JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    format: ReportFormat,
    include_files: bool,
}

impl Reporter {
    /// Create a reporter for a format.
    pub fn new(format: ReportFormat) -> Self {
        Self {
            format,
            include_files: false,
        }
    }

    /// Create a reporter from the report section of the config.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            format: config.format,
            include_files: config.include_files,
        }
    }

    /// List every file outcome in text output.
    pub fn include_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    /// Render the report.
    pub fn render(&self, report: &RunReport) -> Result<String, OrganizeError> {
        match self.format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Text => Ok(self.render_text(report)),
        }
    }

    /// Render the report into a file.
    pub fn write(&self, report: &RunReport, path: &Path) -> Result<(), OrganizeError> {
        let rendered = self.render(report)?;
        let write_err = |source: std::io::Error| OrganizeError::WriteReport {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, rendered).map_err(write_err)
    }

    fn render_text(&self, report: &RunReport) -> String {
        let stats = &report.statistics;
        let mut out = String::new();

        let title = if report.dry_run {
            "Organizer report (dry run)"
        } else {
            "Organizer report"
        };
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.len()));
        let _ = writeln!(out, "Source:      {}", report.source.display());
        let _ = writeln!(out, "Destination: {}", report.destination.display());
        let _ = writeln!(
            out,
            "Started:     {}",
            report.started_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(
            out,
            "Finished:    {}",
            report.finished_at.format("%Y-%m-%d %H:%M:%S")
        );
        out.push('\n');

        let moved_label = if report.dry_run { "Would move" } else { "Moved" };
        let rows = [
            ("Scanned", stats.scanned.to_string()),
            ("Classified", stats.total_classified().to_string()),
            ("Unclassified", stats.unclassified.to_string()),
            ("Duplicates found", stats.duplicates_found.to_string()),
            (
                moved_label,
                format!("{} ({})", stats.moved, format_size(stats.bytes_moved)),
            ),
            ("Skipped", stats.skipped.to_string()),
            ("Errors", stats.errors.to_string()),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "{:<18}{value}", format!("{label}:"));
        }

        if !stats.classified.is_empty() {
            let width = stats.classified.keys().map(String::len).max().unwrap_or(0);
            out.push_str("\nCategories:\n");
            for (category, count) in &stats.classified {
                let _ = writeln!(out, "  {category:<width$}  {count}");
            }
        }

        let errors = report
            .warnings
            .iter()
            .map(ToString::to_string)
            .chain(report.outcomes.iter().filter_map(|o| match &o.action {
                Action::Failed { message } => Some(format!("{}: {message}", o.source.display())),
                _ => None,
            }))
            .collect_vec();
        if !errors.is_empty() {
            out.push_str("\nErrors:\n");
            let _ = writeln!(out, "  {}", errors.iter().join("\n  "));
        }

        if self.include_files && !report.outcomes.is_empty() {
            out.push_str("\nFiles:\n");
            for outcome in &report.outcomes {
                let _ = writeln!(out, "  {}", describe(outcome));
            }
        }

        out
    }
}

/// One line per file for the text report.
fn describe(outcome: &FileOutcome) -> String {
    let category = match &outcome.category {
        Some(name) => format!("{name} {:.0}%", outcome.confidence * 100.0),
        None => "unclassified".to_string(),
    };
    match &outcome.destination {
        Some(dest) if outcome.action.is_transfer() => format!(
            "{} {} -> {} [{category}]",
            outcome.action,
            outcome.source.display(),
            dest.display()
        ),
        _ => format!(
            "{} {} [{category}]",
            outcome.action,
            outcome.source.display()
        ),
    }
}

/// Format a byte size in human-readable form.
pub(crate) fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
