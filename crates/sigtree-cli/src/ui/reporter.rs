//! Console implementation of the core `Reporter`.

use std::path::Path;

use sigtree_core::{LogicalPath, Reporter, SigError};

/// Prints failures to stderr and logs progress through `tracing`.
///
/// Failures are always shown; successes and skips only appear with `-v`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn signed(&self, path: &Path, sidecar: &Path, logical: &LogicalPath) {
        tracing::info!(
            "Signed '{}' as '{}' -> '{}'",
            path.display(),
            logical,
            sidecar.display()
        );
    }

    fn validated(&self, path: &Path, logical: &LogicalPath) {
        tracing::info!("Valid '{}' as '{}'", path.display(), logical);
    }

    fn installed(&self, destination: &Path) {
        tracing::info!("Installed '{}'", destination.display());
    }

    fn created_dir(&self, dir: &Path) {
        tracing::info!("Created directory '{}'", dir.display());
    }

    fn skipped(&self, path: &Path, reason: &str) {
        tracing::info!("Skipped '{}': {reason}", path.display());
    }

    fn failed(&self, _path: &Path, error: &SigError) {
        eprintln!("sigtree: {error}");
    }
}
