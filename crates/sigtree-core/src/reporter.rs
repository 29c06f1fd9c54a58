//! Reporter trait for dependency injection
//!
//! The tools report per-entry progress and failures through this trait so
//! that the core stays independent of how (and whether) lines are shown.

use std::path::Path;

use crate::error::SigError;
use crate::path::LogicalPath;

/// Sink for per-entry progress and failures.
pub trait Reporter: Send + Sync {
    /// A side-car was written for `path`.
    fn signed(&self, path: &Path, sidecar: &Path, logical: &LogicalPath);

    /// `path` verified as `logical`.
    fn validated(&self, path: &Path, logical: &LogicalPath);

    /// `destination` was written (file) or created (symlink).
    fn installed(&self, destination: &Path);

    /// A destination directory was created for a validated child.
    fn created_dir(&self, dir: &Path);

    /// Nothing to do for `path` (already signed, already installed, ...).
    fn skipped(&self, path: &Path, reason: &str);

    /// Processing `path` failed; the batch continues.
    fn failed(&self, path: &Path, error: &SigError);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn signed(&self, path: &Path, sidecar: &Path, logical: &LogicalPath) {
        (**self).signed(path, sidecar, logical);
    }
    fn validated(&self, path: &Path, logical: &LogicalPath) {
        (**self).validated(path, logical);
    }
    fn installed(&self, destination: &Path) {
        (**self).installed(destination);
    }
    fn created_dir(&self, dir: &Path) {
        (**self).created_dir(dir);
    }
    fn skipped(&self, path: &Path, reason: &str) {
        (**self).skipped(path, reason);
    }
    fn failed(&self, path: &Path, error: &SigError) {
        (**self).failed(path, error);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn signed(&self, _: &Path, _: &Path, _: &LogicalPath) {}
    fn validated(&self, _: &Path, _: &LogicalPath) {}
    fn installed(&self, _: &Path) {}
    fn created_dir(&self, _: &Path) {}
    fn skipped(&self, _: &Path, _: &str) {}
    fn failed(&self, _: &Path, _: &SigError) {}
}
