//! sigtree - sign, validate and install signed file trees
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Every regular file and symlink gets an adjacent `.sig` side-car holding
//! an Ed25519 signature over its kind, logical path and content. `install`
//! copies only entries that verify, so a destination tree never contains
//! anything that was not signed by a trusted key.

pub mod cmd;
pub mod config;
pub mod ui;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use sigtree_core::Options;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sigtree")]
#[command(author, version = env!("SIGTREE_VERSION"), about = "sigtree - signed file trees")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file with keys and install groups
    #[arg(long, global = true, env = "SIGTREE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Usage rules clap cannot express declaratively.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if let Commands::Install { paths, .. } = &self.command {
            split_install_paths(paths)?;
        }
        Ok(())
    }
}

/// Split `SOURCE... DESTINATION`.
///
/// No paths means "run the config install groups" and yields `None`. A single
/// path is a usage error.
pub fn split_install_paths(paths: &[PathBuf]) -> Result<Option<(&[PathBuf], &Path)>, clap::Error> {
    match paths.split_last() {
        None => Ok(None),
        Some((_, [])) => Err(Cli::command().error(
            ErrorKind::TooFewValues,
            "install needs at least one SOURCE and a DESTINATION",
        )),
        Some((destination, sources)) => Ok(Some((sources, destination.as_path()))),
    }
}

/// How logical paths are derived from on-disk paths.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Descend into directory arguments
    #[arg(short, long)]
    pub recursive: bool,

    /// Root logical paths are computed against
    #[arg(long, value_name = "DIR")]
    pub relative_to: Option<PathBuf>,

    /// Prefix prepended to every logical path
    #[arg(short = 'p', long, value_name = "PREFIX")]
    pub path_prefix: Option<PathBuf>,
}

impl PathArgs {
    /// Build core options from the flags.
    pub fn options(&self, force: bool) -> Options {
        let mut options = Options::default().recursive(self.recursive).force(force);
        if let Some(root) = &self.relative_to {
            options = options.relative_to(root);
        }
        if let Some(prefix) = &self.path_prefix {
            options = options.path_prefix(prefix);
        }
        options
    }
}

/// Public keys to verify against.
#[derive(Debug, Clone, Default, Args)]
pub struct KeyArgs {
    /// Public key file (repeatable; any key may match)
    #[arg(short = 'k', long = "key", value_name = "PUBKEY")]
    pub keys: Vec<PathBuf>,

    /// Directory of public key files (repeatable)
    #[arg(short = 'K', long = "key-dir", value_name = "DIR")]
    pub key_dirs: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a .sig side-car for every file and symlink
    Sign {
        /// Files or directories to sign
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Private key file
        #[arg(short = 'k', long = "key", value_name = "PRIVKEY")]
        key: PathBuf,
        /// Re-sign entries that already have a side-car
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Check every file and symlink against its side-car
    Validate {
        /// Files or directories to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        keys: KeyArgs,
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Copy verified entries into a destination
    ///
    /// Without arguments, runs the install groups of the config file.
    Install {
        /// Sources followed by the destination
        #[arg(value_name = "SOURCE... DESTINATION")]
        paths: Vec<PathBuf>,
        /// Overwrite existing destination entries
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        keys: KeyArgs,
        #[command(flatten)]
        path_args: PathArgs,
    },
    /// Print the canonical blob of an entry (for external signing)
    Blob {
        /// File or symlink
        file: PathBuf,
        /// Root logical paths are computed against
        #[arg(long, value_name = "DIR")]
        relative_to: Option<PathBuf>,
        /// Prefix prepended to the logical path
        #[arg(short = 'p', long, value_name = "PREFIX")]
        path_prefix: Option<PathBuf>,
    },
    /// Generate an Ed25519 key pair
    Keygen {
        /// Output base name; writes NAME.key and NAME.pub
        #[arg(short, long, default_value = "sigtree")]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
