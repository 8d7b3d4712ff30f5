//! Duplicate detection by whole-file content hashing.
//!
//! The first file seen with a given BLAKE3 digest becomes the original;
//! every later file with the same digest is reported as its duplicate.
//! The index lives only as long as one organizer run.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sortwise_core::{ContentHash, FileCandidate};

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// Compute the full BLAKE3 hash of a file.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let mut hasher = Hasher::new();
    if size > MMAP_THRESHOLD {
        hasher.update_mmap(path)?;
    } else {
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
    }

    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Result of checking one file against the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DuplicateStatus {
    /// First file with this content.
    Original { hash: ContentHash },
    /// Same content as a file seen earlier in the run.
    Duplicate { hash: ContentHash, original: PathBuf },
}

impl DuplicateStatus {
    /// Check if this is a duplicate.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Content hash of the checked file.
    pub fn hash(&self) -> ContentHash {
        match self {
            Self::Original { hash } | Self::Duplicate { hash, .. } => *hash,
        }
    }
}

/// Digest-to-first-path index for one run.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    seen: HashMap<ContentHash, PathBuf>,
}

impl DuplicateIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a candidate and record it if its content is new.
    ///
    /// An unreadable file is an error and is not recorded.
    pub fn check(&mut self, candidate: &FileCandidate) -> io::Result<DuplicateStatus> {
        let hash = hash_file(&candidate.path)?;
        Ok(self.register(hash, &candidate.path))
    }

    /// Record a precomputed hash for a path.
    pub fn register(&mut self, hash: ContentHash, path: &Path) -> DuplicateStatus {
        match self.seen.get(&hash) {
            Some(original) => {
                debug!(
                    path = %path.display(),
                    original = %original.display(),
                    "duplicate content"
                );
                DuplicateStatus::Duplicate {
                    hash,
                    original: original.clone(),
                }
            }
            None => {
                self.seen.insert(hash, path.to_path_buf());
                DuplicateStatus::Original { hash }
            }
        }
    }

    /// Number of distinct contents seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("a.txt"), "same content").unwrap();
        fs::write(root.join("b.txt"), "same content").unwrap();
        fs::write(root.join("c.txt"), "other content").unwrap();

        temp
    }

    #[test]
    fn test_hash_file_matches_blake3() {
        let temp = create_test_files();
        let hash = hash_file(&temp.path().join("a.txt")).unwrap();
        assert_eq!(hash.0, *blake3::hash(b"same content").as_bytes());
    }

    #[test]
    fn test_large_file_uses_same_digest() {
        let temp = TempDir::new().unwrap();
        let data = vec![7u8; (MMAP_THRESHOLD as usize) * 2];
        let path = temp.path().join("large.bin");
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap().0, *blake3::hash(&data).as_bytes());
    }

    #[test]
    fn test_first_seen_is_original() {
        let temp = create_test_files();
        let mut index = DuplicateIndex::new();

        let a = FileCandidate::from_path(temp.path().join("a.txt")).unwrap();
        let b = FileCandidate::from_path(temp.path().join("b.txt")).unwrap();
        let c = FileCandidate::from_path(temp.path().join("c.txt")).unwrap();

        assert!(!index.check(&a).unwrap().is_duplicate());
        match index.check(&b).unwrap() {
            DuplicateStatus::Duplicate { original, .. } => assert_eq!(original, a.path),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert!(!index.check(&c).unwrap().is_duplicate());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_unreadable_file_is_not_recorded() {
        let temp = TempDir::new().unwrap();
        let mut index = DuplicateIndex::new();
        let ghost = FileCandidate::new(
            temp.path().join("ghost"),
            0,
            sortwise_core::Timestamps::with_modified(std::time::SystemTime::now()),
        );

        assert!(index.check(&ghost).is_err());
        assert!(index.is_empty());
    }
}
