//! Recursive discovery of signable entries.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, SigError};
use crate::path::is_sidecar;

/// What the walker found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file.
    RegularFile,
    /// Symbolic link (never followed).
    Symlink,
    /// Directory (recursed into).
    Directory,
}

/// One entry of a tree walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Absolute on-disk path.
    pub path: PathBuf,
    /// Kind as reported by `lstat`.
    pub kind: NodeKind,
    /// 0 for the walk root, 1 for its children, ...
    pub depth: usize,
}

/// Lazy walk over a source tree.
///
/// - names ending in `.sig` below the root are skipped entirely;
/// - a directory or entry that disappears mid-walk is skipped, while a
///   missing root is an error;
/// - unsupported kinds (sockets, devices, FIFOs) and unreadable directories
///   yield one `Err` each and the walk carries on.
///
/// Children are visited in file name order.
pub struct TreeWalker {
    root: PathBuf,
    inner: walkdir::FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
}

fn not_sidecar(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !is_sidecar(entry.file_name())
}

impl TreeWalker {
    /// Start a new walk at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let inner = WalkDir::new(&root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(not_sidecar as fn(&DirEntry) -> bool);
        Self { root, inner }
    }

    fn classify(entry: &DirEntry) -> Result<WalkEntry> {
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            NodeKind::Directory
        } else if file_type.is_file() {
            NodeKind::RegularFile
        } else if file_type.is_symlink() {
            NodeKind::Symlink
        } else {
            return Err(SigError::UnsupportedType(entry.path().to_path_buf()));
        };
        Ok(WalkEntry {
            path: entry.path().to_path_buf(),
            kind,
            depth: entry.depth(),
        })
    }

    fn convert(&self, err: walkdir::Error) -> SigError {
        let path = err
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let source = io::Error::from(err);
        if source.kind() == io::ErrorKind::NotFound {
            SigError::NotFound(path)
        } else {
            SigError::Io {
                context: "Failed to open dir",
                path,
                source,
            }
        }
    }
}

impl std::fmt::Debug for TreeWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWalker")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Iterator for TreeWalker {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => return Some(Self::classify(&entry)),
                Err(err) => {
                    let vanished = err.depth() > 0
                        && err
                            .io_error()
                            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
                    if vanished {
                        tracing::debug!(
                            "Skipping '{}', removed during walk",
                            err.path().unwrap_or(self.root.as_path()).display()
                        );
                        continue;
                    }
                    return Some(Err(self.convert(err)));
                }
            }
        }
    }
}
