//! Batch operations over files and trees.
//!
//! Every operation takes its inputs, keys, [`Options`] and a [`Reporter`] as
//! explicit parameters; nothing is read from process-wide state, so several
//! operations (e.g. install groups from a config file) can run in one process
//! without leaking settings into each other.
//!
//! Failure policy is batch-partial: an entry that fails is reported and
//! counted, and processing continues with its siblings and the remaining
//! inputs. Only problems with the inputs themselves (missing argument,
//! directory without recursive mode) abort before any entry is touched.

pub mod blob;
pub mod install;
pub mod sign;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SigError};
use crate::path::{PathPrefix, canonicalize};
use crate::reporter::Reporter;
use crate::walk::{NodeKind, TreeWalker, WalkEntry};

pub use blob::blob_for_path;
pub use install::install_paths;
pub use sign::sign_paths;
pub use validate::{VerifiedEntry, validate_paths, verify_entry};

/// Per-invocation settings.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Root logical paths are computed against. Defaults to the input
    /// directory itself, or the parent of a file input.
    pub relative_to: Option<PathBuf>,
    /// Prefix prepended to every logical path.
    pub path_prefix: Option<PathPrefix>,
    /// Allow directory inputs and descend into them.
    pub recursive: bool,
    /// Re-sign existing side-cars / overwrite existing destinations.
    pub force: bool,
}

impl Options {
    /// Set the relative-to root.
    pub fn relative_to(mut self, root: impl Into<PathBuf>) -> Self {
        self.relative_to = Some(root.into());
        self
    }

    /// Set the logical path prefix (canonicalized; `/` means none).
    pub fn path_prefix(mut self, prefix: impl AsRef<Path>) -> Self {
        self.path_prefix = PathPrefix::new(prefix);
        self
    }

    /// Enable or disable recursion.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Enable or disable force.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Entries signed, validated or installed.
    pub succeeded: usize,
    /// Entries left alone (already signed / already installed).
    pub skipped: usize,
    /// Entries that failed.
    pub failed: usize,
}

impl Outcome {
    /// True when no entry failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Add another batch's counts.
    pub fn merge(&mut self, other: Outcome) {
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// What happened to a single entry that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryStatus {
    Done,
    Skipped,
}

/// A top-level input that passed preflight.
#[derive(Debug, Clone)]
pub(crate) struct Input {
    /// Canonical path of the argument.
    pub(crate) path: PathBuf,
    /// Argument is a real directory (not a symlink to one).
    pub(crate) is_dir: bool,
    /// Canonical root logical paths are computed against.
    pub(crate) relative_to: PathBuf,
}

/// Canonicalize and check every argument before anything is processed.
pub(crate) fn resolve_inputs(paths: &[PathBuf], options: &Options) -> Result<Vec<Input>> {
    let relative_to = options
        .relative_to
        .as_deref()
        .map(canonicalize)
        .transpose()?;

    paths
        .iter()
        .map(|raw| {
            let path = canonicalize(raw)?;
            let meta = fs::symlink_metadata(&path).map_err(SigError::io("Can't access", &path))?;
            let is_dir = meta.is_dir();
            if is_dir && !options.recursive {
                return Err(SigError::Config(format!(
                    "'{}' is a directory and not in recursive mode",
                    path.display()
                )));
            }
            let relative_to = match &relative_to {
                Some(root) => root.clone(),
                None if is_dir => path.clone(),
                None => path
                    .parent()
                    .map_or_else(|| PathBuf::from("/"), Path::to_path_buf),
            };
            Ok(Input {
                path,
                is_dir,
                relative_to,
            })
        })
        .collect()
}

/// Walk one input and run `process` on every file and symlink.
///
/// Walk errors and errors returned by `process` are reported and counted;
/// they never stop the walk.
pub(crate) fn for_each_entry<F>(input: &Input, reporter: &dyn Reporter, mut process: F) -> Outcome
where
    F: FnMut(&WalkEntry) -> Result<EntryStatus>,
{
    let mut outcome = Outcome::default();
    for item in TreeWalker::new(&input.path) {
        let result = match item {
            Ok(entry) if entry.kind == NodeKind::Directory => continue,
            Ok(entry) => process(&entry).map_err(|e| (entry.path, e)),
            Err(e) => {
                let path = e.path().unwrap_or(input.path.as_path()).to_path_buf();
                Err((path, e))
            }
        };
        match result {
            Ok(EntryStatus::Done) => outcome.succeeded += 1,
            Ok(EntryStatus::Skipped) => outcome.skipped += 1,
            Err((path, e)) => {
                reporter.failed(&path, &e);
                outcome.failed += 1;
            }
        }
    }
    outcome
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_without_recursive_is_config_error() {
        let dir = tempdir().unwrap();
        let err = resolve_inputs(&[dir.path().to_path_buf()], &Options::default()).unwrap_err();
        assert!(matches!(err, SigError::Config(_)));
    }

    #[test]
    fn missing_argument_aborts() {
        let dir = tempdir().unwrap();
        let err = resolve_inputs(&[dir.path().join("nope")], &Options::default()).unwrap_err();
        assert!(matches!(err, SigError::NotFound(_)));
    }

    #[test]
    fn default_relative_to() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();
        let root = canonicalize(dir.path()).unwrap();

        let inputs = resolve_inputs(
            &[dir.path().to_path_buf(), file.clone()],
            &Options::default().recursive(true),
        )
        .unwrap();
        assert!(inputs[0].is_dir);
        assert_eq!(inputs[0].relative_to, root);
        assert!(!inputs[1].is_dir);
        assert_eq!(inputs[1].relative_to, root);

        let inputs = resolve_inputs(&[file], &Options::default().relative_to("/")).unwrap();
        assert_eq!(inputs[0].relative_to, PathBuf::from("/"));
    }
}
