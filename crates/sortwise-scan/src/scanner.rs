//! JWalk-based depth-first directory scanner.

use std::path::PathBuf;
use std::sync::Arc;

use jwalk::{DirEntryIter, Parallelism, WalkDir};
use tracing::{debug, warn};

use sortwise_core::{FileCandidate, ScanConfig, ScanError, ScanWarning, Timestamps, WarningKind};

use crate::filter::ExclusionRules;

/// Single-threaded scanner using jwalk's serial mode.
///
/// Entries are visited depth-first in the order the filesystem reports
/// them; no sorting is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct JwalkScanner;

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Start a scan of the configured root.
    ///
    /// Fails up front if the root does not exist, is not a directory, or the
    /// exclusion patterns do not compile. Everything after that is reported
    /// per entry through the returned iterator.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanIter, ScanError> {
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        // Verify root is a directory
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let filter = Arc::new(ExclusionRules::from_config(config)?);

        let walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .sort(false)
            // Hidden entries are filtered by the exclusion rules instead.
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .min_depth(1)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |depth, _path, _state, children| {
                // The root itself arrives with no parent depth; only its
                // descendants are subject to the exclusion rules.
                if depth.is_none() {
                    return;
                }
                children.retain(|entry_result| match entry_result {
                    Ok(entry) => {
                        let name = entry.file_name().to_string_lossy();
                        if entry.file_type().is_dir() {
                            !filter.excludes_dir(&name, &entry.path())
                        } else {
                            !filter.excludes_file(&name)
                        }
                    }
                    // Keep errors so they surface as warnings.
                    Err(_) => true,
                });
            });

        debug!(root = %root_path.display(), "starting scan");

        Ok(ScanIter {
            root: root_path,
            inner: walker.into_iter(),
        })
    }

    /// Scan eagerly, separating candidates from warnings.
    pub fn collect(&self, config: &ScanConfig) -> Result<ScanOutput, ScanError> {
        let mut output = ScanOutput::default();
        for item in self.scan(config)? {
            match item {
                Ok(candidate) => output.candidates.push(candidate),
                Err(warning) => output.warnings.push(warning),
            }
        }
        Ok(output)
    }
}

/// Eagerly collected scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub candidates: Vec<FileCandidate>,
    pub warnings: Vec<ScanWarning>,
}

/// Lazy stream of scanned files.
///
/// Yields `Ok` for each regular file that passed the exclusion rules and
/// `Err` for each entry that could not be read. Directories, symlinks and
/// special files are not yielded.
pub struct ScanIter {
    root: PathBuf,
    inner: DirEntryIter<((), ())>,
}

impl ScanIter {
    /// Canonical root being scanned.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl Iterator for ScanIter {
    type Item = Result<FileCandidate, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    return Some(Err(to_warning(&err, path, WarningKind::ReadError)));
                }
            };

            // A directory whose listing failed is yielded with the error attached.
            if let Some(err) = &entry.read_children_error {
                return Some(Err(to_warning(err, entry.path(), WarningKind::ReadError)));
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    return Some(Err(to_warning(&err, path, WarningKind::MetadataError)));
                }
            };

            // Followed links may resolve to something other than a file.
            if !metadata.is_file() {
                continue;
            }

            return Some(Ok(FileCandidate::new(
                path,
                metadata.len(),
                Timestamps::from_metadata(&metadata),
            )));
        }
    }
}

/// Convert a walk error into a warning, logging it.
fn to_warning(err: &jwalk::Error, path: PathBuf, fallback: WarningKind) -> ScanWarning {
    let warning = match err.io_error() {
        Some(io) => ScanWarning::from_io(path, io),
        None => ScanWarning::new(path, err.to_string(), fallback),
    };
    warn!(path = %warning.path.display(), "{}", warning.message);
    warning
}
