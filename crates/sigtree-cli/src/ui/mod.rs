//! Console output: progress reporting and batch summaries.

pub mod reporter;

pub use reporter::ConsoleReporter;

use sigtree_core::Outcome;

/// One-line batch summary, logged at info level.
pub fn summary(action: &str, outcome: &Outcome) {
    tracing::info!(
        "{action}: {} ok, {} skipped, {} failed",
        outcome.succeeded,
        outcome.skipped,
        outcome.failed
    );
}
