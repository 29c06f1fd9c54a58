//! Checking entries against their `.sig` side-cars.

use std::fs;
use std::path::{Path, PathBuf};

use super::{EntryStatus, Options, Outcome, for_each_entry, resolve_inputs};
use crate::blob::EntryContent;
use crate::error::{Result, SigError};
use crate::keys::KeySet;
use crate::path::{LogicalPath, PathPrefix, relativize, sidecar_path};
use crate::reporter::Reporter;
use crate::signature::{Signature, Verification, verify_any};

/// An entry whose content verified against its side-car.
#[derive(Debug, Clone)]
pub struct VerifiedEntry {
    /// Content exactly as it was verified.
    pub content: EntryContent,
    /// Identity the signature was checked against.
    pub logical: LogicalPath,
}

/// Load `path` and its side-car and verify them with `keys`.
///
/// The returned content is the verified bytes; callers that act on the
/// entry (the installer) must use these rather than re-reading the source.
///
/// # Errors
///
/// - [`SigError::MissingSignature`] if there is no side-car;
/// - [`SigError::InvalidSignature`] if no key accepts the signature;
/// - [`SigError::Crypto`] if the side-car is not a well-formed signature;
/// - I/O, unsupported-type and out-of-root errors from loading the entry.
pub fn verify_entry(
    path: &Path,
    relative_to: &Path,
    prefix: Option<&PathPrefix>,
    keys: &KeySet,
) -> Result<VerifiedEntry> {
    let sidecar = sidecar_path(path);
    let signature = match fs::read(&sidecar) {
        Ok(bytes) => Signature::from_bytes(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SigError::MissingSignature(path.to_path_buf()));
        }
        Err(source) => {
            return Err(SigError::Io {
                context: "Failed to load",
                path: sidecar,
                source,
            });
        }
    };

    let content = EntryContent::load(path)?;
    let logical = relativize(path, relative_to, prefix)?;

    let blob = content.to_blob(&logical);
    let verification = verify_any(&blob, &signature, keys).map_err(|e| match e {
        SigError::Crypto { reason, .. } => SigError::crypto(
            format!("Signature of '{}' is invalid", path.display()),
            reason,
        ),
        other => other,
    })?;

    match verification {
        Verification::Valid { key_index } => {
            tracing::debug!(
                "'{}' is valid as '{}' (key #{key_index})",
                path.display(),
                logical
            );
            Ok(VerifiedEntry { content, logical })
        }
        Verification::Invalid => Err(SigError::InvalidSignature {
            path: path.to_path_buf(),
            logical: logical.to_string(),
        }),
    }
}

/// Validate every file and symlink reachable from `inputs`.
///
/// Unlike signing, a missing side-car is a failure: every entry must be
/// signed.
///
/// # Errors
///
/// Returns an error only if an input can't be accessed or is a directory
/// without `options.recursive`. Per-entry failures are reported through
/// `reporter` and counted in the returned [`Outcome`].
pub fn validate_paths(
    inputs: &[PathBuf],
    keys: &KeySet,
    options: &Options,
    reporter: &dyn Reporter,
) -> Result<Outcome> {
    let inputs = resolve_inputs(inputs, options)?;
    let mut outcome = Outcome::default();
    for input in &inputs {
        outcome.merge(for_each_entry(input, reporter, |entry| {
            let verified = verify_entry(
                &entry.path,
                &input.relative_to,
                options.path_prefix.as_ref(),
                keys,
            )?;
            reporter.validated(&entry.path, &verified.logical);
            Ok(EntryStatus::Done)
        }));
    }
    Ok(outcome)
}
