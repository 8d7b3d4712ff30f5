//! Placing classified files into the destination tree.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use sortwise_analyze::{ClassificationResult, DuplicateStatus};
use sortwise_core::{
    ConflictPolicy, DuplicatePolicy, FileCandidate, OrganizationConfig, SubBucket, TransferMode,
};

use crate::conflict::{ClaimSet, auto_rename_path};
use crate::operation::{Action, Decision, FileOutcome, MoveError, SkipReason};

/// Folder used by the extension sub-bucket for files without one.
pub const NO_EXTENSION_FOLDER: &str = "no_extension";

/// Options for the mover.
#[derive(Debug, Clone)]
pub struct MoveOptions {
    pub destination_root: PathBuf,
    pub unclassified_folder: String,
    pub duplicates_folder: String,
    pub conflict_policy: ConflictPolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub mode: TransferMode,
    pub sub_bucket: SubBucket,
    /// Decide and log without touching the filesystem.
    pub dry_run: bool,
}

impl MoveOptions {
    /// Build options from the organization section of the config.
    pub fn from_config(config: &OrganizationConfig, dry_run: bool) -> Self {
        Self {
            destination_root: config.destination_directory.clone(),
            unclassified_folder: config.unclassified_folder.clone(),
            duplicates_folder: config.duplicates_folder.clone(),
            conflict_policy: config.conflict_policy,
            duplicate_policy: config.duplicate_policy,
            mode: config.operation,
            sub_bucket: config.sub_bucket,
            dry_run,
        }
    }
}

/// Resolves destinations and performs moves for one run.
#[derive(Debug)]
pub struct Mover {
    options: MoveOptions,
    claims: ClaimSet,
}

impl Mover {
    /// Create a mover.
    ///
    /// The destination root is canonicalized when it exists so it compares
    /// equal to scanned paths.
    pub fn new(mut options: MoveOptions) -> Self {
        if let Ok(canonical) = options.destination_root.canonicalize() {
            options.destination_root = canonical;
        }
        Self {
            options,
            claims: ClaimSet::new(),
        }
    }

    /// Preferred destination before conflict handling.
    pub fn target_path(
        &self,
        candidate: &FileCandidate,
        classification: &ClassificationResult,
        duplicate: bool,
    ) -> PathBuf {
        let mut path = self.options.destination_root.clone();

        if duplicate {
            path.push(&self.options.duplicates_folder);
        } else {
            path.push(
                classification
                    .category
                    .as_deref()
                    .unwrap_or(&self.options.unclassified_folder),
            );
            self.push_sub_bucket(&mut path, candidate, classification);
        }

        path.push(&*candidate.name);
        path
    }

    fn push_sub_bucket(
        &self,
        path: &mut PathBuf,
        candidate: &FileCandidate,
        classification: &ClassificationResult,
    ) {
        match self.options.sub_bucket {
            SubBucket::None => {}
            // Unclassified files have no meaningful confidence.
            SubBucket::Confidence if classification.is_classified() => {
                path.push(classification.tier().as_str());
            }
            SubBucket::Confidence => {}
            SubBucket::ModifiedDate => {
                let modified: DateTime<Local> = candidate.timestamps.modified.into();
                path.push(modified.format("%Y").to_string());
                path.push(modified.format("%m").to_string());
            }
            SubBucket::Extension => {
                if candidate.extension.is_empty() {
                    path.push(NO_EXTENSION_FOLDER);
                } else {
                    path.push(candidate.extension.as_str());
                }
            }
        }
    }

    /// Decide what to do with a file and claim its destination.
    pub fn resolve(
        &mut self,
        candidate: &FileCandidate,
        classification: &ClassificationResult,
        duplicate: Option<&DuplicateStatus>,
    ) -> Decision {
        let is_duplicate = duplicate.is_some_and(DuplicateStatus::is_duplicate);
        if is_duplicate && self.options.duplicate_policy == DuplicatePolicy::Skip {
            return Decision::Skip {
                reason: SkipReason::Duplicate,
                destination: None,
            };
        }

        let target = self.target_path(candidate, classification, is_duplicate);
        if target == candidate.path {
            return Decision::Skip {
                reason: SkipReason::AlreadyInPlace,
                destination: Some(target),
            };
        }

        let (destination, overwrite) = match self.claims.conflict(&target) {
            None => (target, false),
            Some(conflict) => match self.options.conflict_policy {
                ConflictPolicy::Skip => {
                    return Decision::Skip {
                        reason: SkipReason::Conflict { conflict },
                        destination: Some(target),
                    };
                }
                ConflictPolicy::Overwrite => (target, true),
                ConflictPolicy::Rename => {
                    let claims = &self.claims;
                    (
                        auto_rename_path(&target, |p| claims.conflict(p).is_some()),
                        false,
                    )
                }
            },
        };

        self.claims.claim(destination.clone());
        Decision::Transfer {
            destination,
            overwrite,
        }
    }

    /// Resolve and carry out the placement of one file.
    pub fn execute(
        &mut self,
        candidate: &FileCandidate,
        classification: &ClassificationResult,
        duplicate: Option<&DuplicateStatus>,
    ) -> FileOutcome {
        let decision = self.resolve(candidate, classification, duplicate);

        let (destination, action) = match decision {
            Decision::Skip {
                reason,
                destination,
            } => {
                debug!(
                    path = %candidate.path.display(),
                    reason = %reason,
                    "skipping"
                );
                (destination, Action::Skipped { reason })
            }
            Decision::Transfer {
                destination,
                overwrite,
            } => {
                let action = self.transfer(&candidate.path, &destination, overwrite);
                (Some(destination), action)
            }
        };

        FileOutcome {
            source: candidate.path.clone(),
            destination,
            category: classification.category.clone(),
            score: classification.score,
            confidence: classification.confidence,
            duplicate_of: match duplicate {
                Some(DuplicateStatus::Duplicate { original, .. }) => Some(original.clone()),
                _ => None,
            },
            size: candidate.size,
            action,
        }
    }

    fn transfer(&self, source: &Path, destination: &Path, overwrite: bool) -> Action {
        let done = match self.options.mode {
            TransferMode::Move => Action::Moved,
            TransferMode::Copy => Action::Copied,
        };

        if self.options.dry_run {
            info!(
                from = %source.display(),
                to = %destination.display(),
                overwrite,
                "[dry run] would {}",
                self.options.mode
            );
            return done;
        }

        let result = prepare_destination(destination, overwrite).and_then(|()| {
            match self.options.mode {
                TransferMode::Move => move_file(source, destination),
                TransferMode::Copy => copy_file(source, destination),
            }
        });

        match result {
            Ok(()) => {
                info!(
                    from = %source.display(),
                    to = %destination.display(),
                    "{}",
                    done
                );
                done
            }
            Err(e) => {
                warn!(path = %source.display(), error = %e, "placement failed");
                Action::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Create parent directories and clear an existing file if overwriting.
fn prepare_destination(destination: &Path, overwrite: bool) -> Result<(), MoveError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| MoveError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // An earlier claim in a live run may not have produced a file.
    if overwrite && destination.exists() {
        fs::remove_file(destination).map_err(|source| MoveError::RemoveExisting {
            path: destination.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

/// Move a single file, falling back to copy + remove across filesystems.
fn move_file(source: &Path, destination: &Path) -> Result<(), MoveError> {
    // Try rename first (fast path for same filesystem)
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    copy_file(source, destination)?;
    fs::remove_file(source).map_err(|e| MoveError::RemoveSource {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    })
}

fn copy_file(source: &Path, destination: &Path) -> Result<(), MoveError> {
    fs::copy(source, destination)
        .map(|_| ())
        .map_err(|e| MoveError::Transfer {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })
}
