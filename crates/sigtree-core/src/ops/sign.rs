//! Writing `.sig` side-cars.

use std::fs;
use std::path::{Path, PathBuf};

use super::{EntryStatus, Options, Outcome, for_each_entry, resolve_inputs};
use crate::blob::EntryContent;
use crate::error::{Result, SigError};
use crate::keys::PrivateKey;
use crate::path::{relativize, sidecar_path};
use crate::reporter::Reporter;
use crate::signature;

/// Sign every file and symlink reachable from `inputs`.
///
/// Entries that already have a side-car are skipped unless `options.force`
/// is set, so re-running is cheap and does not churn signatures.
///
/// # Errors
///
/// Returns an error only if an input can't be accessed or is a directory
/// without `options.recursive`. Per-entry failures are reported through
/// `reporter` and counted in the returned [`Outcome`].
pub fn sign_paths(
    inputs: &[PathBuf],
    key: &PrivateKey,
    options: &Options,
    reporter: &dyn Reporter,
) -> Result<Outcome> {
    let inputs = resolve_inputs(inputs, options)?;
    let mut outcome = Outcome::default();
    for input in &inputs {
        outcome.merge(for_each_entry(input, reporter, |entry| {
            sign_entry(&entry.path, &input.relative_to, key, options, reporter)
        }));
    }
    Ok(outcome)
}

fn sign_entry(
    path: &Path,
    relative_to: &Path,
    key: &PrivateKey,
    options: &Options,
    reporter: &dyn Reporter,
) -> Result<EntryStatus> {
    let sidecar = sidecar_path(path);
    if !options.force && fs::symlink_metadata(&sidecar).is_ok() {
        reporter.skipped(path, "already signed");
        return Ok(EntryStatus::Skipped);
    }

    let content = EntryContent::load(path)?;
    let logical = relativize(path, relative_to, options.path_prefix.as_ref())?;
    tracing::debug!("Signing '{}' as '{}'", path.display(), logical);

    let signature = signature::sign(&content.to_blob(&logical), key)?;
    // Plain create-or-truncate; side-cars are regenerated by re-signing.
    fs::write(&sidecar, signature.as_bytes()).map_err(|source| SigError::Io {
        context: "Failed to write file",
        path: sidecar.clone(),
        source,
    })?;

    reporter.signed(path, &sidecar, &logical);
    Ok(EntryStatus::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::RecordingReporter;
    use crate::path::LogicalPath;
    use crate::reporter::NullReporter;
    use tempfile::tempdir;

    /// Removes `doomed` right after the first side-car is written.
    struct RemoveAfterFirstSign {
        doomed: PathBuf,
    }

    impl Reporter for RemoveAfterFirstSign {
        fn signed(&self, _: &Path, _: &Path, _: &LogicalPath) {
            if self.doomed.exists() {
                fs::remove_dir_all(&self.doomed).unwrap();
            }
        }
        fn validated(&self, _: &Path, _: &LogicalPath) {}
        fn installed(&self, _: &Path) {}
        fn created_dir(&self, _: &Path) {}
        fn skipped(&self, _: &Path, _: &str) {}
        fn failed(&self, path: &Path, error: &SigError) {
            panic!("unexpected failure for '{}': {error}", path.display());
        }
    }

    fn canonical(path: &Path) -> PathBuf {
        crate::path::canonicalize(path).unwrap()
    }

    #[test]
    fn signs_files_and_symlinks_recursively() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a"), "A").unwrap();
        fs::write(dir.path().join("sub/b"), "B").unwrap();
        std::os::unix::fs::symlink("a", dir.path().join("link")).unwrap();

        let key = PrivateKey::generate();
        let outcome = sign_paths(
            &[dir.path().to_path_buf()],
            &key,
            &Options::default().recursive(true),
            &NullReporter,
        )
        .unwrap();

        assert_eq!(outcome.succeeded, 3);
        assert!(outcome.is_success());
        for name in ["a.sig", "sub/b.sig", "link.sig"] {
            let sig = fs::read(dir.path().join(name)).unwrap();
            assert_eq!(sig.len(), 64, "{name}");
        }
        assert!(!dir.path().join("sub.sig").exists());
    }

    #[test]
    fn existing_sidecar_is_skipped_without_force() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "content").unwrap();
        let key = PrivateKey::generate();

        let files = std::slice::from_ref(&file);
        sign_paths(files, &key, &Options::default(), &NullReporter).unwrap();
        let first = fs::read(dir.path().join("f.sig")).unwrap();

        // A different key would produce a different side-car if it re-signed.
        let other = PrivateKey::generate();
        let reporter = RecordingReporter::default();
        let outcome = sign_paths(files, &other, &Options::default(), &reporter).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(
            reporter.skipped.lock().unwrap().as_slice(),
            &[canonical(&file)]
        );
        assert_eq!(fs::read(dir.path().join("f.sig")).unwrap(), first);

        let outcome = sign_paths(
            &[file],
            &other,
            &Options::default().force(true),
            &NullReporter,
        )
        .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_ne!(fs::read(dir.path().join("f.sig")).unwrap(), first);
    }

    #[test]
    fn orphan_sidecars_are_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), "A").unwrap();
        fs::write(dir.path().join("b.sig"), "stale").unwrap();

        let outcome = sign_paths(
            &[dir.path().to_path_buf()],
            &PrivateKey::generate(),
            &Options::default().recursive(true),
            &NullReporter,
        )
        .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert!(dir.path().join("a.sig").exists());
        assert!(!dir.path().join("b.sig.sig").exists());
    }

    #[test]
    fn out_of_root_entry_fails_alone() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        fs::write(dir.path().join("in/f"), "f").unwrap();
        fs::write(dir.path().join("g"), "g").unwrap();

        let reporter = RecordingReporter::default();
        let outcome = sign_paths(
            &[dir.path().join("in/f"), dir.path().join("g")],
            &PrivateKey::generate(),
            &Options::default().relative_to(dir.path().join("in")),
            &reporter,
        )
        .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert!(reporter.failures()[0].1.contains("not inside relative dir"));
    }

    #[test]
    fn directory_removed_while_signing_is_not_a_failure() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/f"), "f").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/g"), "g").unwrap();
        fs::write(dir.path().join("c"), "c").unwrap();

        let reporter = RemoveAfterFirstSign {
            doomed: dir.path().join("b"),
        };
        let outcome = sign_paths(
            &[dir.path().to_path_buf()],
            &PrivateKey::generate(),
            &Options::default().recursive(true),
            &reporter,
        )
        .unwrap();

        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.succeeded, 2);
        assert!(dir.path().join("a/f.sig").exists());
        assert!(dir.path().join("c.sig").exists());
        assert!(!dir.path().join("b").exists());
    }
}
