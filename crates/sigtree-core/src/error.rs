//! Error taxonomy shared by every sigtree operation.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout `sigtree-core`.
pub type Result<T, E = SigError> = std::result::Result<T, E>;

/// Errors produced while signing, validating or installing entries.
///
/// A verification *mismatch* is not an error at the [`crate::signature`]
/// level; the tools turn it into [`SigError::InvalidSignature`] only when
/// they report the entry as failed.
#[derive(Error, Debug)]
pub enum SigError {
    /// The source entry does not exist.
    #[error("Can't access '{}': No such file or directory", .0.display())]
    NotFound(PathBuf),

    /// The `.sig` side-car of an entry does not exist.
    #[error("No signature for '{}'", .0.display())]
    MissingSignature(PathBuf),

    /// The filesystem object is not a regular file, symlink or directory.
    #[error("Unsupported file type for '{}'", .0.display())]
    UnsupportedType(PathBuf),

    /// The path cannot be expressed relative to the declared root.
    #[error("File '{}' not inside relative dir '{}'", path.display(), root.display())]
    OutOfRoot {
        /// Offending path.
        path: PathBuf,
        /// Declared relative-to root.
        root: PathBuf,
    },

    /// No key in the key set accepted the signature.
    #[error("Signature of '{}' (as '{}') is invalid", path.display(), logical)]
    InvalidSignature {
        /// On-disk path of the entry.
        path: PathBuf,
        /// Logical path the signature was checked against.
        logical: String,
    },

    /// Key parsing, signing backend or malformed signature bytes.
    #[error("{context}: {reason}")]
    Crypto {
        /// What was being attempted.
        context: String,
        /// Backend message.
        reason: String,
    },

    /// System-level read/write/rename/mkdir failure.
    #[error("{context} '{}': {source}", path.display())]
    Io {
        /// What was being attempted.
        context: &'static str,
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Malformed or incomplete configuration.
    #[error("{0}")]
    Config(String),
}

impl SigError {
    /// Build a mapper from `io::Error` for `path`.
    ///
    /// `NotFound` is folded into [`SigError::NotFound`] so callers can match
    /// on absence without inspecting the OS error.
    pub fn io(context: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| {
            if source.kind() == io::ErrorKind::NotFound {
                Self::NotFound(path)
            } else {
                Self::Io {
                    context,
                    path,
                    source,
                }
            }
        }
    }

    /// Create a crypto error with context.
    pub fn crypto(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Crypto {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// The filesystem path this error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(path)
            | Self::MissingSignature(path)
            | Self::UnsupportedType(path)
            | Self::OutOfRoot { path, .. }
            | Self::InvalidSignature { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::Crypto { .. } | Self::Config(_) => None,
        }
    }

    /// True for the `NotFound` class (missing entry or missing side-car).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::MissingSignature(_))
    }
}
