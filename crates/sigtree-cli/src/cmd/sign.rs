//! Sign command

use anyhow::{Context, Result};
use sigtree_core::{Outcome, PrivateKey, sign_paths};
use std::path::{Path, PathBuf};

use crate::PathArgs;
use crate::ui::{self, ConsoleReporter};

/// Write side-cars for `files` with the private key at `key`.
pub fn sign(files: &[PathBuf], key: &Path, force: bool, paths: &PathArgs) -> Result<Outcome> {
    let key = PrivateKey::load(key).context("Failed to load signing key")?;
    let reporter = ConsoleReporter;
    let outcome = sign_paths(files, &key, &paths.options(force), &reporter)?;
    ui::summary("sign", &outcome);
    Ok(outcome)
}
