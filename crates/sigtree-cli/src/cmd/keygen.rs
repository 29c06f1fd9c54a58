//! Keygen command

use anyhow::{Context, Result};
use sigtree_core::PrivateKey;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Generate a key pair and write `NAME.key` (0600) and `NAME.pub`.
///
/// Existing files are never overwritten.
pub fn keygen(output: &Path) -> Result<()> {
    let key = PrivateKey::generate();
    let public = key.public_key();

    let secret_path = with_extension(output, "key");
    let public_path = with_extension(output, "pub");

    write_new(&secret_path, &key.to_base64(), 0o600)?;
    write_new(&public_path, &public.to_base64(), 0o644)?;

    println!("  key id: {}", public.id());
    println!("  public: {}", public.to_base64());
    println!("  wrote {}", secret_path.display());
    println!("  wrote {}", public_path.display());
    Ok(())
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn write_new(path: &Path, content: &str, mode: u32) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    writeln!(file, "{content}").with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(())
}
