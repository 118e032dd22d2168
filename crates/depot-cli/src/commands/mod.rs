//! Command dispatch and handler modules.

mod library;
mod repo;
mod resolve;

use std::path::Path;

use miette::Result;

use depot_core::config::DepotConfig;
use depot_util::errors::DepotError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Resolve {
            descriptor,
            scope,
            json,
        } => resolve::exec(&config, &descriptor, &scope, json).await,
        Command::Library { coordinate, scope } => {
            library::exec(&config, &coordinate, &scope).await
        }
        Command::Repo { action } => repo::exec(&config, action).await,
    }
}

fn load_config(explicit: Option<&Path>) -> Result<DepotConfig> {
    let config = match explicit {
        Some(path) => DepotConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir().map_err(DepotError::Io)?;
            DepotConfig::discover(&cwd)?
        }
    };
    tracing::debug!("Using configuration rooted at {}", config.base_dir.display());
    Ok(config)
}
