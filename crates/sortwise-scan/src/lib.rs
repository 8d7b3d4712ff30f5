//! Directory walking for sortwise.
//!
//! `sortwise-scan` turns a source directory into a lazy stream of
//! [`FileCandidate`]s:
//!
//! - **Depth-first, single-threaded** traversal via jwalk in serial mode
//! - **Subtree pruning** for excluded directory names and pruned paths
//! - **File filters** for name substrings, glob patterns and extensions
//! - **Non-fatal warnings** for unreadable entries
//!
//! # Example
//!
//! ```rust,no_run
//! use sortwise_scan::{JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! for item in JwalkScanner::new().scan(&config).unwrap() {
//!     match item {
//!         Ok(candidate) => println!("{}", candidate.path.display()),
//!         Err(warning) => eprintln!("skipped: {warning}"),
//!     }
//! }
//! ```

mod filter;
mod scanner;

pub use filter::ExclusionRules;
pub use scanner::{JwalkScanner, ScanIter, ScanOutput};

// Re-export core types for convenience
pub use sortwise_core::{FileCandidate, ScanConfig, ScanError, ScanWarning, WarningKind};
