//! Validate command

use anyhow::{Result, bail};
use sigtree_core::{Outcome, validate_paths};
use std::path::PathBuf;

use crate::config::Config;
use crate::ui::{self, ConsoleReporter};
use crate::{KeyArgs, PathArgs};

/// Check `files` against their side-cars.
pub fn validate(
    files: &[PathBuf],
    keys: &KeyArgs,
    paths: &PathArgs,
    config: &Config,
) -> Result<Outcome> {
    let trusted = config.trusted_keys(keys)?;
    if trusted.is_empty() {
        bail!("No public keys given (use --key or --key-dir)");
    }
    tracing::debug!("Validating with {} key(s)", trusted.len());

    let reporter = ConsoleReporter;
    let outcome = validate_paths(files, &trusted, &paths.options(false), &reporter)?;
    ui::summary("validate", &outcome);
    Ok(outcome)
}
