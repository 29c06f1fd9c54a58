//! sigtree - sign, validate and install signed file trees

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sigtree_cli::cmd;
use sigtree_cli::config::Config;
use sigtree_cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("sigtree: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Returns whether every processed entry succeeded.
fn run(cli: Cli) -> Result<bool> {
    let config = || Config::load_optional(cli.config.as_deref());

    let outcome = match cli.command {
        Commands::Sign {
            files,
            key,
            force,
            paths,
        } => cmd::sign::sign(&files, &key, force, &paths)?,
        Commands::Validate { files, keys, paths } => {
            cmd::validate::validate(&files, &keys, &paths, &config()?)?
        }
        Commands::Install {
            paths,
            force,
            keys,
            path_args,
        } => cmd::install::install(&paths, force, &keys, &path_args, &config()?)?,
        Commands::Blob {
            file,
            relative_to,
            path_prefix,
        } => {
            cmd::blob::blob(&file, relative_to.as_deref(), path_prefix.as_deref())?;
            return Ok(true);
        }
        Commands::Keygen { output } => {
            cmd::keygen::keygen(&output)?;
            return Ok(true);
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            return Ok(true);
        }
    };
    Ok(outcome.is_success())
}
