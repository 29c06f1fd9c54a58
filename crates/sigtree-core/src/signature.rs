//! Signing and multi-key verification of canonical blobs.

use ed25519_dalek::{Signature as Ed25519Signature, Signer};

use crate::blob::CanonicalBlob;
use crate::error::{Result, SigError};
use crate::keys::{KeySet, PrivateKey};

/// Raw signature bytes, exactly as stored in a `.sig` side-car.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap bytes read from a side-car. No validation happens here.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn parse(&self) -> Result<Ed25519Signature> {
        let bytes = <&[u8; Ed25519Signature::BYTE_SIZE]>::try_from(self.0.as_slice())
            .map_err(|_| {
                SigError::crypto(
                    "Malformed signature",
                    format!(
                        "expected {} bytes, got {}",
                        Ed25519Signature::BYTE_SIZE,
                        self.0.len()
                    ),
                )
            })?;
        Ok(Ed25519Signature::from_bytes(bytes))
    }
}

/// Outcome of checking a signature against a key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The key at `key_index` (trust order) verified the signature.
    Valid {
        /// Position of the accepting key in the [`KeySet`].
        key_index: usize,
    },
    /// No key verified the signature.
    Invalid,
}

impl Verification {
    /// True for [`Verification::Valid`].
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Sign a blob.
///
/// # Errors
///
/// Returns [`SigError::Crypto`] if the signing backend fails.
pub fn sign(blob: &CanonicalBlob, key: &PrivateKey) -> Result<Signature> {
    let signature = key
        .signing_key()
        .try_sign(blob.as_bytes())
        .map_err(|e| SigError::crypto("Error signing data", e))?;
    Ok(Signature(signature.to_bytes().to_vec()))
}

/// Check `signature` over `blob` with each key in order, stopping at the
/// first one that accepts.
///
/// A mismatch is [`Verification::Invalid`], including for an empty key set.
///
/// # Errors
///
/// Returns [`SigError::Crypto`] only when the signature bytes can't be an
/// Ed25519 signature at all.
pub fn verify_any(
    blob: &CanonicalBlob,
    signature: &Signature,
    keys: &KeySet,
) -> Result<Verification> {
    let signature = signature.parse()?;
    for (key_index, key) in keys.iter().enumerate() {
        if key
            .verifying_key()
            .verify_strict(blob.as_bytes(), &signature)
            .is_ok()
        {
            tracing::debug!("Signature accepted by key {}", key.id());
            return Ok(Verification::Valid { key_index });
        }
    }
    Ok(Verification::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::EntryKind;
    use crate::path::relativize;
    use std::path::Path;

    fn blob(kind: EntryKind, path: &str, content: &[u8]) -> CanonicalBlob {
        let logical = relativize(&Path::new("/r").join(path), Path::new("/r"), None).unwrap();
        CanonicalBlob::encode(kind, &logical, content)
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let key = PrivateKey::generate();
        let keys: KeySet = [key.public_key()].into_iter().collect();
        for (kind, path, content) in [
            (EntryKind::RegularFile, "etc/app.conf", &b"port = 80\n"[..]),
            (EntryKind::RegularFile, "empty", &b""[..]),
            (EntryKind::Symlink, "current", &b"releases/42"[..]),
        ] {
            let blob = blob(kind, path, content);
            let sig = sign(&blob, &key).unwrap();
            assert!(verify_any(&blob, &sig, &keys).unwrap().is_valid());
        }
    }

    #[test]
    fn foreign_key_set_is_invalid_not_error() {
        let key = PrivateKey::generate();
        let others: KeySet = (0..3)
            .map(|_| PrivateKey::generate().public_key())
            .collect();
        let blob = blob(EntryKind::RegularFile, "f", b"data");
        let sig = sign(&blob, &key).unwrap();

        assert_eq!(
            verify_any(&blob, &sig, &others).unwrap(),
            Verification::Invalid
        );
        assert_eq!(
            verify_any(&blob, &sig, &KeySet::new()).unwrap(),
            Verification::Invalid
        );
    }

    #[test]
    fn any_key_in_set_is_enough() {
        let old = PrivateKey::generate();
        let new = PrivateKey::generate();
        let keys: KeySet = [old.public_key(), new.public_key()].into_iter().collect();
        let blob = blob(EntryKind::RegularFile, "f", b"rotated");

        let sig = sign(&blob, &new).unwrap();
        assert_eq!(
            verify_any(&blob, &sig, &keys).unwrap(),
            Verification::Valid { key_index: 1 }
        );
    }

    #[test]
    fn signature_is_bound_to_path_and_kind() {
        let key = PrivateKey::generate();
        let keys: KeySet = [key.public_key()].into_iter().collect();
        let original = blob(EntryKind::RegularFile, "a", b"same");
        let sig = sign(&original, &key).unwrap();

        let moved = blob(EntryKind::RegularFile, "b", b"same");
        let retyped = blob(EntryKind::Symlink, "a", b"same");
        assert!(!verify_any(&moved, &sig, &keys).unwrap().is_valid());
        assert!(!verify_any(&retyped, &sig, &keys).unwrap().is_valid());
    }

    #[test]
    fn malformed_signature_is_error() {
        let keys: KeySet = [PrivateKey::generate().public_key()].into_iter().collect();
        let blob = blob(EntryKind::RegularFile, "f", b"x");
        let err = verify_any(&blob, &Signature::from_bytes(vec![0; 10]), &keys).unwrap_err();
        assert!(matches!(err, SigError::Crypto { .. }));
    }
}
