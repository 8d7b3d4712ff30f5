//! File placement engine for sortwise.
//!
//! The [`Mover`] turns a classification into a destination path, applies
//! the conflict and duplicate policies, and moves or copies the file. Every
//! destination it hands out is claimed for the rest of the run, which keeps
//! dry runs and live runs in agreement about conflicts.

mod conflict;
mod move_op;
mod operation;

pub use conflict::{ClaimSet, ConflictKind, auto_rename_path};
pub use move_op::{MoveOptions, Mover, NO_EXTENSION_FOLDER};
pub use operation::{Action, Decision, FileOutcome, MoveError, SkipReason};
