//! Install command

use anyhow::{Context, Result, bail};
use sigtree_core::{Outcome, install_paths};
use std::path::PathBuf;

use crate::config::Config;
use crate::ui::{self, ConsoleReporter};
use crate::{KeyArgs, PathArgs, split_install_paths};

/// Install `SOURCE... DESTINATION`, or every config install group when no
/// paths are given.
pub fn install(
    paths: &[PathBuf],
    force: bool,
    keys: &KeyArgs,
    path_args: &PathArgs,
    config: &Config,
) -> Result<Outcome> {
    let shared = config.trusted_keys(keys)?;
    let reporter = ConsoleReporter;

    let outcome = match split_install_paths(paths)? {
        None => run_groups(config, &shared, force, path_args, &reporter)?,
        Some((sources, destination)) => {
            if shared.is_empty() {
                bail!("No public keys given (use --key or --key-dir)");
            }
            install_paths(
                sources,
                destination,
                &shared,
                &path_args.options(force),
                &reporter,
            )?
        }
    };
    ui::summary("install", &outcome);
    Ok(outcome)
}

fn run_groups(
    config: &Config,
    shared: &sigtree_core::KeySet,
    force: bool,
    path_args: &PathArgs,
    reporter: &ConsoleReporter,
) -> Result<Outcome> {
    if config.install.is_empty() {
        bail!("No paths given and no [[install]] groups configured");
    }

    let mut outcome = Outcome::default();
    for (i, group) in config.install.iter().enumerate() {
        let n = i + 1;
        let keys = group
            .trusted_keys(shared)
            .with_context(|| format!("Failed to load keys of install group #{n}"))?;
        if keys.is_empty() {
            bail!("Install group #{n} has no public keys");
        }
        tracing::info!("Install group #{n} -> '{}'", group.destination.display());
        let group_outcome = install_paths(
            &group.sources,
            &group.destination,
            &keys,
            &group.options(path_args, force),
            reporter,
        )
        .with_context(|| format!("Install group #{n} failed"))?;
        outcome.merge(group_outcome);
    }
    Ok(outcome)
}
