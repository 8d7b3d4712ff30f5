//! Analysis stages for sortwise.
//!
//! - **Classification** - score each file against weighted category rules
//! - **Duplicate detection** - whole-file BLAKE3 hashing against an
//!   in-memory index of first-seen files
//!
//! # Classification
//!
//! Every signal of every rule is evaluated independently and scores
//! accumulate per category. The strictly highest score wins; ties go to the
//! higher priority, then to the first declared category.
//!
//! ```rust,ignore
//! use sortwise_analyze::Classifier;
//! use sortwise_core::{FileCandidate, OrganizerConfig};
//!
//! let config = OrganizerConfig::load("organizer.yaml")?;
//! let classifier = Classifier::new(config.rule_set()?);
//! let result = classifier.classify(&FileCandidate::from_path("invoice.pdf")?);
//! println!("{:?} ({:.0}%)", result.category, result.confidence * 100.0);
//! ```
//!
//! # Duplicate Detection
//!
//! ```rust,ignore
//! use sortwise_analyze::{DuplicateIndex, DuplicateStatus};
//!
//! let mut index = DuplicateIndex::new();
//! if let DuplicateStatus::Duplicate { original, .. } = index.check(&candidate)? {
//!     println!("{} duplicates {}", candidate.path.display(), original.display());
//! }
//! ```

mod classifier;
mod content;
mod duplicates;

pub use classifier::{
    ClassificationResult, Classifier, ClassifierConfig, ClassifierConfigBuilder, ConfidenceTier,
    SignalHit,
};
pub use content::{BINARY_SNIFF_BYTES, read_text_sample};
pub use duplicates::{DuplicateIndex, DuplicateStatus, hash_file};

// Re-export core types
pub use sortwise_core::{ContentHash, FileCandidate, RuleSet};
