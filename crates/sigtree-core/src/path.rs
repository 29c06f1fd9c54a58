//! Logical path computation.
//!
//! The logical path is the identity bound into every signature. It is derived
//! from the on-disk path by stripping a declared root and optionally adding a
//! prefix, and must come out identical at sign time and at verify time.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SigError};

/// File name suffix of signature side-cars.
pub const SIDECAR_SUFFIX: &str = ".sig";

/// A relative, normalized path as embedded in the canonical blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalPath(PathBuf);

impl LogicalPath {
    /// Borrow as a `Path`.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Raw bytes, exactly as they are signed.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_os_str().as_bytes()
    }

    /// True when the entry is the root itself and no prefix was given.
    pub fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A canonicalized logical path prefix.
///
/// `..` and `.` are resolved against `/` before the leading slash is dropped,
/// so a prefix can never climb out of the logical namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix(PathBuf);

impl PathPrefix {
    /// Canonicalize `raw`. Returns `None` when nothing is left (e.g. `/`).
    pub fn new(raw: impl AsRef<Path>) -> Option<Self> {
        let anchored = normalize_lexically(&Path::new("/").join(raw.as_ref()));
        let relative = anchored.strip_prefix("/").unwrap_or(&anchored);
        if relative.as_os_str().is_empty() {
            None
        } else {
            Some(Self(relative.to_path_buf()))
        }
    }

    /// Borrow as a `Path`.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Symlinks are deliberately not followed: a symlink's own location is its
/// signed identity. `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Make `path` absolute against the current directory and normalize it.
///
/// # Errors
///
/// Returns [`SigError::Io`] if the current directory cannot be determined.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_lexically(path));
    }
    let cwd = std::env::current_dir().map_err(SigError::io("Can't get current dir", path))?;
    Ok(normalize_lexically(&cwd.join(path)))
}

/// Compute the logical path of `path` below `root`, with optional prefix.
///
/// Matching is done on path elements, so `/a/bb` is not inside `/a/b`, and
/// repeated separators are insignificant.
///
/// # Errors
///
/// Returns [`SigError::OutOfRoot`] if `path` is neither `root` nor nested
/// under it, or if the remainder would climb out of `root` via `..`.
pub fn relativize(path: &Path, root: &Path, prefix: Option<&PathPrefix>) -> Result<LogicalPath> {
    let out_of_root = || SigError::OutOfRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let rel = path.strip_prefix(root).map_err(|_| out_of_root())?;
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(out_of_root());
    }
    let rel = normalize_lexically(rel);

    let logical = match prefix {
        Some(prefix) if rel.as_os_str().is_empty() => prefix.0.clone(),
        Some(prefix) => prefix.0.join(rel),
        None => rel,
    };
    Ok(LogicalPath(logical))
}

/// `<path>.sig`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// True for directory entry names that are signature side-cars.
pub fn is_sidecar(name: &OsStr) -> bool {
    name.as_bytes().ends_with(SIDECAR_SUFFIX.as_bytes())
}
