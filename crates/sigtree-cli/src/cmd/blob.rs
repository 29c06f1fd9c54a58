//! Blob command

use anyhow::{Context, Result};
use sigtree_core::{Options, blob_for_path};
use std::io::Write;
use std::path::Path;

/// Write the canonical blob of `file` to stdout.
pub fn blob(file: &Path, relative_to: Option<&Path>, path_prefix: Option<&Path>) -> Result<()> {
    let mut options = Options::default();
    if let Some(root) = relative_to {
        options = options.relative_to(root);
    }
    if let Some(prefix) = path_prefix {
        options = options.path_prefix(prefix);
    }

    let blob = blob_for_path(file, &options)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(blob.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write blob to stdout")?;
    Ok(())
}
