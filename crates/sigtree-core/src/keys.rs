//! Ed25519 key handles and key-file loading.
//!
//! Key files hold the Base64 encoding of the raw 32-byte key. Whitespace
//! around the encoded value is ignored so that files written by editors with a
//! trailing newline load fine.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::error::{Result, SigError};

const KEY_LEN: usize = 32;

fn decode_key(encoded: &str, what: &str, origin: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SigError::crypto(format!("Can't parse {what} {origin}"), e))?;
    <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        SigError::crypto(
            format!("Can't parse {what} {origin}"),
            format!("expected {KEY_LEN} bytes, got {}", bytes.len()),
        )
    })
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(SigError::io("Can't load key", path))
}

/// Private key used for signing.
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut secret = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut secret);
        Self {
            inner: SigningKey::from_bytes(&secret),
        }
    }

    /// Parse a Base64-encoded 32-byte secret.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::Crypto`] if the value is not valid Base64 or has
    /// the wrong length.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let secret = decode_key(encoded, "private key", "value")?;
        Ok(Self {
            inner: SigningKey::from_bytes(&secret),
        })
    }

    /// Load a private key file.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::NotFound`] / [`SigError::Io`] if the file can't be
    /// read and [`SigError::Crypto`] if it can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let encoded = read_key_file(path)?;
        let secret = decode_key(&encoded, "private key", &path.display().to_string())?;
        let key = Self {
            inner: SigningKey::from_bytes(&secret),
        };
        tracing::info!(
            "Loaded private key '{}' ({})",
            path.display(),
            key.public_key().id()
        );
        Ok(key)
    }

    /// Base64 encoding of the secret, as stored in key files.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.inner.to_bytes())
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.verifying_key(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key().id())
            .finish_non_exhaustive()
    }
}

/// Public key used for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Parse a Base64-encoded 32-byte public key.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::Crypto`] if the value is not a valid key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Self::parse(encoded, "value")
    }

    fn parse(encoded: &str, origin: &str) -> Result<Self> {
        let bytes = decode_key(encoded, "public key", origin)?;
        let inner = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| SigError::crypto(format!("Can't parse public key {origin}"), e))?;
        Ok(Self { inner })
    }

    /// Load a public key file.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::NotFound`] / [`SigError::Io`] if the file can't be
    /// read and [`SigError::Crypto`] if it can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let encoded = read_key_file(path)?;
        let key = Self::parse(&encoded, &path.display().to_string())?;
        tracing::info!("Loaded public key '{}' ({})", path.display(), key.id());
        Ok(key)
    }

    /// Base64 encoding, as stored in key files.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.inner.to_bytes())
    }

    /// Short hex identifier for logs (first 8 key bytes).
    pub fn id(&self) -> String {
        hex::encode(&self.inner.as_bytes()[..8])
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.id()).finish()
    }
}

/// Ordered set of trusted public keys. A signature is accepted if any of
/// them verifies it.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<PublicKey>,
}

impl KeySet {
    /// Empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key.
    pub fn push(&mut self, key: PublicKey) {
        self.keys.push(key);
    }

    /// Load and append a key file.
    ///
    /// # Errors
    ///
    /// See [`PublicKey::load`].
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        self.push(PublicKey::load(path)?);
        Ok(())
    }

    /// Load and append every key in `dir`, in file name order.
    ///
    /// A missing directory contributes no keys. Subdirectories and dangling
    /// entries are skipped; any other file must parse as a public key.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::Io`] if the directory can't be listed, or the
    /// error of the first key file that fails to load.
    pub fn load_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Key dir '{}' does not exist", dir.display());
                return Ok(());
            }
            Err(e) => {
                return Err(SigError::Io {
                    context: "Can't enumerate key dir",
                    path: dir.to_path_buf(),
                    source: e,
                });
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()
            .map_err(SigError::io("Can't enumerate key dir", dir))?;
        paths.sort();

        for path in paths {
            let skip = match fs::metadata(&path) {
                Ok(meta) => meta.is_dir(),
                Err(e) => e.kind() == std::io::ErrorKind::NotFound,
            };
            if skip {
                continue;
            }
            match PublicKey::load(&path) {
                Ok(key) => self.push(key),
                Err(SigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Keys in trust order.
    pub fn iter(&self) -> impl Iterator<Item = &PublicKey> {
        self.keys.iter()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is trusted (every verification will fail).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<PublicKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = PublicKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl Extend<PublicKey> for KeySet {
    fn extend<I: IntoIterator<Item = PublicKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn base64_round_trip() {
        let key = PrivateKey::generate();
        let again = PrivateKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.public_key(), again.public_key());

        let encoded = format!("{}\n", key.public_key().to_base64());
        let public = PublicKey::from_base64(&encoded).unwrap();
        assert_eq!(public, key.public_key());
    }

    #[test]
    fn wrong_length_is_crypto_error() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            PublicKey::from_base64(&short),
            Err(SigError::Crypto { .. })
        ));
        assert!(matches!(
            PrivateKey::from_base64("not base64!"),
            Err(SigError::Crypto { .. })
        ));
    }

    #[test]
    fn missing_key_file_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            PublicKey::load(&dir.path().join("absent.pub")),
            Err(SigError::NotFound(_))
        ));
    }

    #[test]
    fn load_dir_collects_keys_and_skips_subdirs() {
        let dir = tempdir().unwrap();
        let a = PrivateKey::generate().public_key();
        let b = PrivateKey::generate().public_key();
        fs::write(dir.path().join("a.pub"), a.to_base64()).unwrap();
        fs::write(dir.path().join("b.pub"), b.to_base64()).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let mut keys = KeySet::new();
        keys.load_dir(dir.path()).unwrap();
        let loaded: Vec<_> = keys.iter().cloned().collect();
        assert_eq!(loaded, vec![a, b]);
    }

    #[test]
    fn load_dir_missing_is_empty() {
        let dir = tempdir().unwrap();
        let mut keys = KeySet::new();
        keys.load_dir(&dir.path().join("trusted.d")).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn load_dir_rejects_garbage() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README"), "not a key").unwrap();
        let mut keys = KeySet::new();
        assert!(keys.load_dir(dir.path()).is_err());
    }
}
