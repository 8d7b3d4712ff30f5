//! Destination conflict detection and renaming.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Why a destination is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// A file already exists on disk at the destination.
    Exists,
    /// An earlier file in this run was placed at the destination.
    Claimed,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exists => write!(f, "destination already exists"),
            Self::Claimed => write!(f, "destination already taken in this run"),
        }
    }
}

/// Destinations handed out during one run.
///
/// Dry runs never touch the disk, so the claims stand in for the files a
/// live run would have created and both see the same conflicts.
#[derive(Debug, Default)]
pub struct ClaimSet {
    paths: HashSet<PathBuf>,
}

impl ClaimSet {
    /// Create an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a path is free, returning the conflict if not.
    pub fn conflict(&self, path: &Path) -> Option<ConflictKind> {
        if self.paths.contains(path) {
            Some(ConflictKind::Claimed)
        } else if path.exists() {
            Some(ConflictKind::Exists)
        } else {
            None
        }
    }

    /// Mark a path as taken.
    pub fn claim(&mut self, path: PathBuf) {
        self.paths.insert(path);
    }

    /// Number of claimed paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Generate a free name next to `path`.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc. A candidate is
/// free when `is_taken` rejects it.
pub fn auto_rename_path(path: &Path, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy());

    let name_with = |suffix: &str| match &extension {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };

    for i in 1..10_000 {
        let candidate = parent.join(name_with(&format!(" ({i})")));
        if !is_taken(&candidate) {
            return candidate;
        }
    }

    // Fallback: use timestamp
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    parent.join(name_with(&format!("_{timestamp}")))
}
