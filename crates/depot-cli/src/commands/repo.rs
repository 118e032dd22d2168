//! Handlers for `depot repo`.

use std::path::Path;
use std::sync::Arc;

use miette::Result;

use depot_core::config::DepotConfig;
use depot_core::version::Version;
use depot_maven::source::ArtifactSource;
use depot_repo::directory::DirectoryRepository;
use depot_repo::provider::{Artifact, RepositoryListener, RepositoryProvider, Strategy};
use depot_resolver::provider::MavenProvider;
use depot_util::errors::{DepotError, DepotResult};
use depot_util::status::{status, status_info};

use crate::cli::RepoAction;

/// Reports stored artifacts on the terminal.
struct StatusListener;

impl RepositoryListener for StatusListener {
    fn artifact_added(
        &self,
        repository: &dyn RepositoryProvider,
        artifact: &Artifact,
        location: &Path,
    ) -> DepotResult<()> {
        status(
            "Stored",
            &format!("{artifact} in {} ({})", repository.name(), location.display()),
        );
        Ok(())
    }
}

/// The repository named `name`, or the first `[[repository]]` when unnamed.
fn open(config: &DepotConfig, name: Option<&str>) -> Result<Box<dyn RepositoryProvider>> {
    if name == Some(MavenProvider::NAME) {
        let source = ArtifactSource::from_config(config)?;
        return Ok(Box::new(
            MavenProvider::new(Arc::new(source)).with_concurrency(config.fetch.concurrency),
        ));
    }

    let entry = match name {
        Some(name) => config.repository(name).ok_or_else(|| DepotError::NotFound {
            what: format!("repository '{name}' in depot.toml"),
        })?,
        None => config.repository.first().ok_or_else(|| DepotError::Config {
            message: "no [[repository]] configured; add one or pass --repo maven".to_string(),
        })?,
    };
    let repository =
        DirectoryRepository::from_entry(entry, config)?.with_listener(Arc::new(StatusListener));
    tracing::debug!("Opened {repository}");
    Ok(Box::new(repository))
}

pub async fn exec(config: &DepotConfig, action: RepoAction) -> Result<()> {
    match action {
        RepoAction::List { pattern, repo } => {
            let repository = open(config, repo.as_deref())?;
            for name in repository.list(pattern.as_deref()).await? {
                println!("{name}");
            }
            Ok(())
        }
        RepoAction::Versions { name, repo } => {
            let repository = open(config, repo.as_deref())?;
            let versions = repository.versions(&name).await?;
            if versions.is_empty() {
                status_info("Versions", &format!("none found for {name}"));
            }
            for version in versions {
                println!("{version}");
            }
            Ok(())
        }
        RepoAction::Get {
            name,
            version,
            strategy,
            repo,
        } => {
            let strategy: Strategy = strategy.parse()?;
            let repository = open(config, repo.as_deref())?;
            match repository.resolve(&name, version.as_deref(), strategy).await? {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => Err(DepotError::NotFound {
                    what: format!(
                        "{name} matching '{}' ({strategy}) in {}",
                        version.as_deref().unwrap_or("any version"),
                        repository.name()
                    ),
                }
                .into()),
            }
        }
        RepoAction::Put {
            name,
            version,
            file,
            repo,
        } => {
            let version = Version::parse(&version)?;
            let mut artifact = Artifact::new(&name, version, &file);
            if file.extension().is_some_and(|ext| ext == "lib") {
                artifact = artifact.with_extension("lib");
            }
            let repository = open(config, repo.as_deref())?;
            let location = repository.store(&artifact).await?;
            println!("{}", location.display());
            Ok(())
        }
    }
}
