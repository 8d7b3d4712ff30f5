//! Discovered file types.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(
        modified: SystemTime,
        accessed: Option<SystemTime>,
        created: Option<SystemTime>,
    ) -> Self {
        Self {
            modified,
            accessed,
            created,
        }
    }

    /// Read timestamps from file metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self::new(
            metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
            metadata.accessed().ok(),
            metadata.created().ok(),
        )
    }
}

/// A regular file discovered by the scanner.
///
/// Candidates are read-only once created; every later stage borrows them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCandidate {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// File name (last path component).
    pub name: CompactString,

    /// Lowercase extension without the leading dot (empty if none).
    pub extension: CompactString,

    /// Size in bytes.
    pub size: u64,

    /// File metadata timestamps.
    pub timestamps: Timestamps,
}

impl FileCandidate {
    /// Create a candidate from a path and its timestamps.
    pub fn new(path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        let extension = extension_of(&path);

        Self {
            path,
            name,
            extension,
            size,
            timestamps,
        }
    }

    /// Build a candidate by reading metadata from disk.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        Ok(Self::new(
            path,
            metadata.len(),
            Timestamps::from_metadata(&metadata),
        ))
    }

    /// Time elapsed since last modification, relative to `now`.
    pub fn age_since_modified(&self, now: SystemTime) -> Duration {
        now.duration_since(self.timestamps.modified)
            .unwrap_or(Duration::ZERO)
    }

    /// Time elapsed since last access, if the platform reports it.
    pub fn age_since_accessed(&self, now: SystemTime) -> Option<Duration> {
        self.timestamps
            .accessed
            .map(|t| now.duration_since(t).unwrap_or(Duration::ZERO))
    }

    /// Names of the directories containing this file, outermost first.
    pub fn parent_components(&self) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
        self.path
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .filter_map(|c| match c {
                std::path::Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
    }
}

/// Lowercase extension of a path, without the dot.
fn extension_of(path: &Path) -> CompactString {
    path.extension()
        .map(|e| CompactString::new(e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
