//! Installing verified entries into a destination tree.
//!
//! # Implementation Note: Lazy Directory Creation
//!
//! A destination directory is only created right before the first verified
//! child is written into it. Walking a source directory never creates
//! anything by itself, so a subdirectory whose entries all fail verification
//! never appears under the destination. Creating directories eagerly would
//! let anyone who can drop an unsigned directory into the source tree get
//! arbitrary directory names created at the destination.
//!
//! Once created, a directory stays even if later siblings fail: the
//! guarantee is "no directory without at least one valid child".
//!
//! File content always goes through a temporary file in the destination
//! directory followed by `rename`, so the final name shows either the old
//! content or the new content, never a partial write.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::{EntryStatus, Options, Outcome, for_each_entry, resolve_inputs};
use crate::blob::EntryKind;
use crate::error::{Result, SigError};
use crate::keys::KeySet;
use crate::path::canonicalize;
use crate::reporter::Reporter;

use super::validate::verify_entry;

const FILE_MODE: u32 = 0o644;

/// Verify and install `sources` into `destination`.
///
/// A file source `src/f` lands at `destination/f`; a directory source has
/// its contents installed directly under `destination`. Every entry is
/// re-verified here regardless of any earlier validation.
///
/// # Errors
///
/// Returns an error only if a source can't be accessed or is a directory
/// without `options.recursive`. Per-entry failures are reported through
/// `reporter` and counted in the returned [`Outcome`].
pub fn install_paths(
    sources: &[PathBuf],
    destination: &Path,
    keys: &KeySet,
    options: &Options,
    reporter: &dyn Reporter,
) -> Result<Outcome> {
    let inputs = resolve_inputs(sources, options)?;
    let destination = canonicalize(destination)?;

    let mut outcome = Outcome::default();
    for input in &inputs {
        let target_root = if input.is_dir {
            destination.clone()
        } else {
            let name = input.path.file_name().ok_or_else(|| {
                SigError::Config(format!("'{}' has no file name", input.path.display()))
            })?;
            destination.join(name)
        };

        outcome.merge(for_each_entry(input, reporter, |entry| {
            let rel = entry
                .path
                .strip_prefix(&input.path)
                .map_err(|_| SigError::OutOfRoot {
                    path: entry.path.clone(),
                    root: input.path.clone(),
                })?;
            let target = if rel.as_os_str().is_empty() {
                target_root.clone()
            } else {
                target_root.join(rel)
            };
            install_entry(
                &entry.path,
                &target,
                &input.relative_to,
                keys,
                options,
                reporter,
            )
        }));
    }
    Ok(outcome)
}

fn install_entry(
    source: &Path,
    target: &Path,
    relative_to: &Path,
    keys: &KeySet,
    options: &Options,
    reporter: &dyn Reporter,
) -> Result<EntryStatus> {
    let verified = verify_entry(source, relative_to, options.path_prefix.as_ref(), keys)?;

    if !options.force && fs::symlink_metadata(target).is_ok() {
        reporter.skipped(target, "already exists");
        return Ok(EntryStatus::Skipped);
    }

    let parent = target.parent().ok_or_else(|| {
        SigError::Config(format!("'{}' has no parent directory", target.display()))
    })?;
    ensure_dir(parent, reporter)?;

    match verified.content.kind {
        EntryKind::RegularFile => write_atomically(parent, target, &verified.content.bytes)?,
        EntryKind::Symlink => replace_symlink(target, &verified.content.bytes)?,
    }

    reporter.installed(target);
    Ok(EntryStatus::Done)
}

/// Create `dir` and any missing ancestors, reporting each one created.
fn ensure_dir(dir: &Path, reporter: &dyn Reporter) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let missing: Vec<&Path> = dir.ancestors().take_while(|p| !p.is_dir()).collect();
    for path in missing.into_iter().rev() {
        match fs::create_dir(path) {
            Ok(()) => reporter.created_dir(path),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(SigError::Io {
                    context: "Can't create directory",
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
    Ok(())
}

fn write_atomically(dir: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let io_err = |source| SigError::Io {
        context: "Can't write",
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".sigtree-")
        .tempfile_in(dir)
        .map_err(io_err)?;
    tmp.write_all(content).map_err(io_err)?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(FILE_MODE))
        .map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(target).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Unlink then symlink. Not atomic: a concurrent reader can briefly see
/// the name missing.
fn replace_symlink(target: &Path, link_target: &[u8]) -> Result<()> {
    fs::remove_file(target)
        .or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(e)
            }
        })
        .map_err(|source| SigError::Io {
            context: "Can't replace",
            path: target.to_path_buf(),
            source,
        })?;
    std::os::unix::fs::symlink(OsStr::from_bytes(link_target), target).map_err(|source| {
        SigError::Io {
            context: "Can't create symlink",
            path: target.to_path_buf(),
            source,
        }
    })
}
