//! Optional TOML config: trusted keys and install groups.
//!
//! ```toml
//! keys = ["/etc/sigtree/release.pub"]
//! key_dirs = ["/etc/sigtree/trusted.d"]
//!
//! [[install]]
//! sources = ["/srv/payload"]
//! destination = "/etc/payload"
//! recursive = true
//! relative_to = "/srv"
//! path_prefix = "payload"
//! ```
//!
//! Relative paths in the file are resolved against the file's directory.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sigtree_core::{KeySet, Options};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{KeyArgs, PathArgs};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Public key files trusted by every command.
    #[serde(default)]
    pub keys: Vec<PathBuf>,
    /// Directories of public key files trusted by every command.
    #[serde(default)]
    pub key_dirs: Vec<PathBuf>,
    /// Install groups run by `sigtree install` without arguments.
    #[serde(default)]
    pub install: Vec<InstallGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallGroup {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub force: bool,
    pub relative_to: Option<PathBuf>,
    pub path_prefix: Option<PathBuf>,
    /// Extra keys for this group only.
    #[serde(default)]
    pub keys: Vec<PathBuf>,
    #[serde(default)]
    pub key_dirs: Vec<PathBuf>,
}

impl Config {
    /// Load the config file if one was given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        tracing::debug!(
            "Loaded config '{}' ({} install groups)",
            path.display(),
            config.install.len()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        for (i, group) in config.install.iter().enumerate() {
            if group.sources.is_empty() {
                bail!("install group #{} has no sources", i + 1);
            }
        }
        Ok(config)
    }

    /// Global keys from the file followed by those from the command line.
    pub fn trusted_keys(&self, cli: &KeyArgs) -> Result<KeySet> {
        let mut set = KeySet::new();
        load_keys(&mut set, &self.keys, &self.key_dirs)?;
        load_keys(&mut set, &cli.keys, &cli.key_dirs)?;
        Ok(set)
    }

    fn rebase(&mut self, base: &Path) {
        rebase_all(&mut self.keys, base);
        rebase_all(&mut self.key_dirs, base);
        for group in &mut self.install {
            rebase_all(&mut group.sources, base);
            rebase_all(&mut group.keys, base);
            rebase_all(&mut group.key_dirs, base);
            rebase(&mut group.destination, base);
            if let Some(root) = &mut group.relative_to {
                rebase(root, base);
            }
        }
    }
}

impl InstallGroup {
    /// The group's keys appended to the shared ones.
    pub fn trusted_keys(&self, shared: &KeySet) -> Result<KeySet> {
        let mut set = shared.clone();
        load_keys(&mut set, &self.keys, &self.key_dirs)?;
        Ok(set)
    }

    /// Group options, with command-line flags taking precedence.
    pub fn options(&self, cli: &PathArgs, force: bool) -> Options {
        let mut options = Options::default()
            .recursive(self.recursive || cli.recursive)
            .force(self.force || force);
        if let Some(root) = cli.relative_to.as_ref().or(self.relative_to.as_ref()) {
            options = options.relative_to(root);
        }
        if let Some(prefix) = cli.path_prefix.as_ref().or(self.path_prefix.as_ref()) {
            options = options.path_prefix(prefix);
        }
        options
    }
}

fn load_keys(set: &mut KeySet, files: &[PathBuf], dirs: &[PathBuf]) -> Result<()> {
    for file in files {
        set.load_file(file)?;
    }
    for dir in dirs {
        set.load_dir(dir)?;
    }
    Ok(())
}

fn rebase(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

fn rebase_all(paths: &mut [PathBuf], base: &Path) {
    for path in paths {
        rebase(path, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigtree_core::PrivateKey;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
            keys = ["a.pub"]
            key_dirs = ["trusted.d"]

            [[install]]
            sources = ["payload"]
            destination = "/etc/payload"
            recursive = true
            relative_to = "."
            path_prefix = "payload"

            [[install]]
            sources = ["one.conf", "two.conf"]
            destination = "/etc"
            keys = ["extra.pub"]
            "#,
        )
        .unwrap();
        assert_eq!(config.keys, vec![PathBuf::from("a.pub")]);
        assert_eq!(config.install.len(), 2);
        assert!(config.install[0].recursive);
        assert!(!config.install[1].force);
        assert_eq!(config.install[1].keys, vec![PathBuf::from("extra.pub")]);
    }

    #[test]
    fn rejects_unknown_fields_and_empty_groups() {
        assert!(Config::parse("key = []").is_err());
        assert!(Config::parse("[[install]]\nsources = []\ndestination = \"/x\"").is_err());
        assert!(Config::parse("[[install]]\nsources = [\"a\"]").is_err());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigtree.toml");
        fs::write(
            &path,
            "keys = [\"k.pub\"]\n[[install]]\nsources = [\"src\"]\ndestination = \"/abs\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys, vec![dir.path().join("k.pub")]);
        assert_eq!(config.install[0].sources, vec![dir.path().join("src")]);
        assert_eq!(config.install[0].destination, PathBuf::from("/abs"));
    }

    #[test]
    fn cli_keys_append_and_groups_extend() {
        let dir = tempfile::tempdir().unwrap();
        let write_key = |name: &str| {
            let key = PrivateKey::generate().public_key();
            let path = dir.path().join(name);
            fs::write(&path, key.to_base64()).unwrap();
            path
        };
        let config = Config {
            keys: vec![write_key("global.pub")],
            ..Config::default()
        };
        let cli = KeyArgs {
            keys: vec![write_key("cli.pub")],
            key_dirs: vec![dir.path().join("missing.d")],
        };
        let shared = config.trusted_keys(&cli).unwrap();
        assert_eq!(shared.len(), 2);

        let group = InstallGroup {
            sources: vec![dir.path().to_path_buf()],
            destination: dir.path().join("dest"),
            recursive: false,
            force: false,
            relative_to: Some(dir.path().to_path_buf()),
            path_prefix: None,
            keys: vec![write_key("group.pub")],
            key_dirs: vec![],
        };
        assert_eq!(group.trusted_keys(&shared).unwrap().len(), 3);
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn cli_flags_override_group() {
        let group = InstallGroup {
            sources: vec![PathBuf::from("/src")],
            destination: PathBuf::from("/dest"),
            recursive: true,
            force: false,
            relative_to: Some(PathBuf::from("/src")),
            path_prefix: Some(PathBuf::from("group")),
            keys: vec![],
            key_dirs: vec![],
        };
        let cli = PathArgs {
            recursive: false,
            relative_to: Some(PathBuf::from("/")),
            path_prefix: None,
        };
        let options = group.options(&cli, true);
        assert!(options.recursive);
        assert!(options.force);
        assert_eq!(options.relative_to, Some(PathBuf::from("/")));
        assert_eq!(
            options.path_prefix.unwrap().as_path(),
            Path::new("group")
        );
    }
}
