//! Canonical blob encoding.
//!
//! Every signature covers the bytes
//!
//! ```text
//! [kind: u8][logical path bytes][0x00][content bytes]
//! ```
//!
//! where `kind` is 0 for a regular file and 1 for a symlink. Binding the kind
//! and the logical path prevents a valid signature from being replayed for a
//! different path or for a symlink pointing at the signed bytes.

use std::fs;
use std::os::unix::ffi::OsStringExt;
use std::path::Path;

use crate::error::{Result, SigError};
use crate::path::LogicalPath;

/// The two signable kinds of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file; content is the file bytes.
    RegularFile,
    /// Symbolic link; content is the (undereferenced) link target.
    Symlink,
}

impl EntryKind {
    /// Map an `lstat` file type to a signable kind.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::UnsupportedType`] for directories, devices, FIFOs
    /// and sockets.
    pub fn from_file_type(file_type: fs::FileType, path: &Path) -> Result<Self> {
        if file_type.is_file() {
            Ok(Self::RegularFile)
        } else if file_type.is_symlink() {
            Ok(Self::Symlink)
        } else {
            Err(SigError::UnsupportedType(path.to_path_buf()))
        }
    }

    /// Discriminant byte written at the start of the blob.
    pub const fn discriminant(self) -> u8 {
        match self {
            Self::RegularFile => 0,
            Self::Symlink => 1,
        }
    }
}

/// The exact byte sequence that is signed and verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBlob(Vec<u8>);

impl CanonicalBlob {
    /// Encode `(kind, logical, content)`.
    pub fn encode(kind: EntryKind, logical: &LogicalPath, content: &[u8]) -> Self {
        let path = logical.as_bytes();
        let mut buf = Vec::with_capacity(1 + path.len() + 1 + content.len());
        buf.push(kind.discriminant());
        buf.extend_from_slice(path);
        buf.push(0);
        buf.extend_from_slice(content);
        Self(buf)
    }

    /// Borrow the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take ownership of the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// A signable entry loaded from disk.
#[derive(Debug, Clone)]
pub struct EntryContent {
    /// Kind determined by `lstat`.
    pub kind: EntryKind,
    /// File bytes or symlink target.
    pub bytes: Vec<u8>,
}

impl EntryContent {
    /// `lstat` the path and read what gets signed.
    ///
    /// # Errors
    ///
    /// [`SigError::NotFound`] if the entry is missing,
    /// [`SigError::UnsupportedType`] for non-signable kinds, or
    /// [`SigError::Io`] if reading fails.
    pub fn load(path: &Path) -> Result<Self> {
        let meta = fs::symlink_metadata(path).map_err(SigError::io("Can't access", path))?;
        let kind = EntryKind::from_file_type(meta.file_type(), path)?;
        let bytes = match kind {
            EntryKind::RegularFile => {
                fs::read(path).map_err(SigError::io("Failed to read", path))?
            }
            EntryKind::Symlink => fs::read_link(path)
                .map_err(SigError::io("Failed to read link", path))?
                .into_os_string()
                .into_vec(),
        };
        Ok(Self { kind, bytes })
    }

    /// Encode this entry under `logical`.
    pub fn to_blob(&self, logical: &LogicalPath) -> CanonicalBlob {
        CanonicalBlob::encode(self.kind, logical, &self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::relativize;
    use tempfile::tempdir;

    fn logical(s: &str) -> LogicalPath {
        relativize(&Path::new("/root").join(s), Path::new("/root"), None).unwrap()
    }

    #[test]
    fn layout_is_kind_path_nul_content() {
        let blob = CanonicalBlob::encode(EntryKind::RegularFile, &logical("a/b"), b"xyz");
        assert_eq!(blob.as_bytes(), b"\x00a/b\x00xyz");

        let blob = CanonicalBlob::encode(EntryKind::Symlink, &logical("l"), b"target");
        assert_eq!(blob.as_bytes(), b"\x01l\x00target");
    }

    #[test]
    fn content_may_contain_nul() {
        let blob = CanonicalBlob::encode(EntryKind::RegularFile, &logical("f"), b"\x00\x00");
        assert_eq!(blob.into_bytes(), vec![0, b'f', 0, 0, 0]);
    }

    #[test]
    fn kind_and_path_change_the_blob() {
        let file = CanonicalBlob::encode(EntryKind::RegularFile, &logical("x"), b"t");
        let link = CanonicalBlob::encode(EntryKind::Symlink, &logical("x"), b"t");
        let moved = CanonicalBlob::encode(EntryKind::RegularFile, &logical("y"), b"t");
        assert_ne!(file, link);
        assert_ne!(file, moved);
    }

    #[test]
    fn load_regular_file_and_symlink() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data");
        std::fs::write(&file, b"payload").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("data", &link).unwrap();

        let entry = EntryContent::load(&file).unwrap();
        assert_eq!(entry.kind, EntryKind::RegularFile);
        assert_eq!(entry.bytes, b"payload");

        let entry = EntryContent::load(&link).unwrap();
        assert_eq!(entry.kind, EntryKind::Symlink);
        assert_eq!(entry.bytes, b"data");
    }

    #[test]
    fn load_rejects_directories_and_missing() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            EntryContent::load(dir.path()),
            Err(SigError::UnsupportedType(_))
        ));
        assert!(matches!(
            EntryContent::load(&dir.path().join("absent")),
            Err(SigError::NotFound(_))
        ));
    }
}
