//! The organizer pipeline.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::Local;
use tracing::{Dispatch, debug, info, info_span, warn};

use sortwise_analyze::{Classifier, ClassifierConfig, DuplicateIndex};
use sortwise_core::{FileCandidate, OrganizerConfig, RunStatistics, ScanConfig, ScanWarning};
use sortwise_ops::{Action, FileOutcome, MoveOptions, Mover};
use sortwise_scan::JwalkScanner;

use crate::error::OrganizeError;
use crate::report::RunReport;

/// Per-invocation switches that are not part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Decide and report without touching the filesystem.
    pub dry_run: bool,
    /// Reference time for age signals (default: now).
    pub reference_time: Option<SystemTime>,
}

impl RunOptions {
    /// Options for a dry run.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// State of one pass over the source tree.
///
/// Owns the duplicate index, the counters, the mover's claims and the
/// collected outcomes; all of it is dropped with the run.
pub struct OrganizerRun {
    scan_config: ScanConfig,
    classifier: Classifier,
    duplicates: Option<DuplicateIndex>,
    mover: Mover,
    stats: RunStatistics,
    outcomes: Vec<FileOutcome>,
    warnings: Vec<ScanWarning>,
    source: PathBuf,
    destination: PathBuf,
    dry_run: bool,
}

impl OrganizerRun {
    /// Prepare a run from a configuration.
    ///
    /// Validates the configuration and compiles the rules; nothing is read
    /// from the source tree yet.
    pub fn new(config: &OrganizerConfig, options: RunOptions) -> Result<Self, OrganizeError> {
        config.validate()?;
        let rules = config.rule_set()?;
        debug!(
            rules = rules.len(),
            reads_content = rules.uses_content(),
            "rules compiled"
        );

        let mut classifier_config = ClassifierConfig::from(&config.classification);
        if let Some(time) = options.reference_time {
            classifier_config.reference_time = time;
        }

        let stats = RunStatistics::with_categories(rules.categories());
        let classifier = Classifier::with_config(rules, classifier_config);
        let mover = Mover::new(MoveOptions::from_config(
            &config.organization,
            options.dry_run,
        ));

        Ok(Self {
            scan_config: config.scan_config(),
            classifier,
            duplicates: config
                .organization
                .detect_duplicates
                .then(DuplicateIndex::new),
            mover,
            stats,
            outcomes: Vec::new(),
            warnings: Vec::new(),
            source: config.source_directory.clone(),
            destination: config.organization.destination_directory.clone(),
            dry_run: options.dry_run,
        })
    }

    /// Run with a caller-provided logger installed for the duration.
    pub fn run_with_dispatch(self, dispatch: &Dispatch) -> Result<RunReport, OrganizeError> {
        tracing::dispatcher::with_default(dispatch, || self.run())
    }

    /// Scan, classify and place every file, then build the report.
    ///
    /// Fails only if the source cannot be scanned at all; per-file problems
    /// are counted and recorded as outcomes.
    pub fn run(mut self) -> Result<RunReport, OrganizeError> {
        let started_at = Local::now();
        let span = info_span!("organize", source = %self.source.display(), dry_run = self.dry_run);
        let _enter = span.enter();

        info!(destination = %self.destination.display(), "starting run");

        let scan = JwalkScanner::new().scan(&self.scan_config)?;
        for item in scan {
            match item {
                Ok(candidate) => self.process(candidate),
                Err(warning) => {
                    self.stats.record_error();
                    self.warnings.push(warning);
                }
            }
        }

        info!(
            scanned = self.stats.scanned,
            moved = self.stats.moved,
            skipped = self.stats.skipped,
            duplicates = self.stats.duplicates_found,
            errors = self.stats.errors,
            "run complete"
        );

        Ok(RunReport {
            started_at,
            finished_at: Local::now(),
            source: self.source,
            destination: self.destination,
            dry_run: self.dry_run,
            statistics: self.stats,
            outcomes: self.outcomes,
            warnings: self.warnings,
        })
    }

    fn process(&mut self, candidate: FileCandidate) {
        self.stats.record_scanned();

        let classification = self.classifier.classify(&candidate);
        self.stats
            .record_classified(classification.category.as_deref());
        debug!(
            path = %candidate.path.display(),
            category = classification.category.as_deref().unwrap_or("-"),
            score = classification.score,
            confidence = classification.confidence,
            "classified"
        );

        let status = match self.duplicates.as_mut().map(|index| index.check(&candidate)) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(e)) => {
                warn!(path = %candidate.path.display(), error = %e, "could not hash file");
                self.stats.record_error();
                let mut outcome = FileOutcome::failed(
                    candidate.path.clone(),
                    candidate.size,
                    format!("could not hash: {e}"),
                );
                outcome.category = classification.category;
                outcome.score = classification.score;
                outcome.confidence = classification.confidence;
                self.outcomes.push(outcome);
                return;
            }
        };

        if status.as_ref().is_some_and(|s| s.is_duplicate()) {
            self.stats.record_duplicate();
        }

        let outcome = self
            .mover
            .execute(&candidate, &classification, status.as_ref());
        match &outcome.action {
            Action::Moved | Action::Copied => self.stats.record_moved(candidate.size),
            Action::Skipped { .. } => self.stats.record_skipped(),
            Action::Failed { .. } => self.stats.record_error(),
        }
        self.outcomes.push(outcome);
    }
}
