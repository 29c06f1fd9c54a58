//! Ed25519 signing, validation and verified installation of file trees.
//!
//! Each regular file or symlink `X` gets a side-car `X.sig` holding the raw
//! 64-byte signature over a [`CanonicalBlob`] that binds the entry kind, its
//! logical path and its content. The installer only ever copies entries
//! whose signature verifies, and creates destination directories only for
//! entries that verified.

pub mod blob;
pub mod error;
pub mod keys;
pub mod ops;
pub mod path;
pub mod reporter;
pub mod signature;
pub mod walk;

pub use blob::{CanonicalBlob, EntryContent, EntryKind};
pub use error::{Result, SigError};
pub use keys::{KeySet, PrivateKey, PublicKey};
pub use ops::{
    Options, Outcome, VerifiedEntry, blob_for_path, install_paths, sign_paths, validate_paths,
    verify_entry,
};
pub use path::{LogicalPath, PathPrefix};
pub use reporter::{NullReporter, Reporter};
pub use signature::{Signature, Verification};
