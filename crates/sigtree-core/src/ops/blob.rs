//! Producing the canonical blob of a single entry.

use std::path::{Path, PathBuf};

use super::Options;
use crate::blob::{CanonicalBlob, EntryContent};
use crate::error::Result;
use crate::path::{canonicalize, relativize};

/// Build the exact bytes that `sign` would sign for `path`.
///
/// Useful for signing with an external tool. The relative-to root defaults
/// to the parent of `path`.
///
/// # Errors
///
/// Fails if `path` can't be loaded, is not a file or symlink, or lies
/// outside the relative-to root.
pub fn blob_for_path(path: &Path, options: &Options) -> Result<CanonicalBlob> {
    let path = canonicalize(path)?;
    let root = match &options.relative_to {
        Some(root) => canonicalize(root)?,
        None => path
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf),
    };
    let content = EntryContent::load(&path)?;
    let logical = relativize(&path, &root, options.path_prefix.as_ref())?;
    Ok(content.to_blob(&logical))
}
