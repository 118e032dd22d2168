//! Maven remotes exposed through the [`RepositoryProvider`] contract.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use depot_core::coordinate::Coordinate;
use depot_core::dependency::Scope;
use depot_core::version::{Version, LATEST};
use depot_maven::source::DescriptorSource;
use depot_repo::provider::{Artifact, RepositoryProvider, Strategy};
use depot_util::errors::{is_not_found, DepotError, DepotResult};

use crate::resolver::DependencyResolver;

/// Read-only provider over an [`ArtifactSource`](depot_maven::source::ArtifactSource).
///
/// Names are `group+artifact` and versions must be concrete.
pub struct MavenProvider {
    source: Arc<dyn DescriptorSource>,
    resolver: DependencyResolver,
}

impl MavenProvider {
    pub const NAME: &'static str = "maven";

    pub fn new(source: Arc<dyn DescriptorSource>) -> Self {
        Self {
            resolver: DependencyResolver::new(source.clone()),
            source,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.resolver = self.resolver.with_concurrency(concurrency);
        self
    }

    /// The `<scope>.lib` listing for `name` at `version`.
    pub async fn library(&self, name: &str, version: &str, scope: Scope) -> DepotResult<PathBuf> {
        let coordinate = coordinate(name, Some(version))?;
        let fetched = self.source.fetch(&coordinate).await?;
        self.resolver
            .library(&fetched.descriptor, &fetched.descriptor_path, scope)
            .await
    }
}

fn coordinate(name: &str, version: Option<&str>) -> DepotResult<Coordinate> {
    let Some((group, artifact)) = name.split_once('+').filter(|(g, a)| !g.is_empty() && !a.is_empty())
    else {
        return Err(DepotError::InvalidRequest {
            message: format!("expected 'group+artifact', got '{name}'"),
        }
        .into());
    };
    let version = version.map(str::trim).unwrap_or_default();
    if version.is_empty() || version == LATEST || version.starts_with(['[', '(']) {
        return Err(DepotError::InvalidRequest {
            message: format!("{name} needs a concrete version, got '{version}'"),
        }
        .into());
    }
    Ok(Coordinate::new(group, artifact, version))
}

fn unsupported(operation: &str) -> miette::Report {
    DepotError::Unsupported {
        repository: MavenProvider::NAME.to_string(),
        operation: operation.to_string(),
    }
    .into()
}

#[async_trait]
impl RepositoryProvider for MavenProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn can_write(&self) -> bool {
        false
    }

    /// The strategy is irrelevant: only one version can match.
    async fn resolve(
        &self,
        name: &str,
        constraint: Option<&str>,
        _strategy: Strategy,
    ) -> DepotResult<Option<PathBuf>> {
        let coordinate = coordinate(name, constraint)?;
        match self.source.artifact(&coordinate).await {
            Err(e) if is_not_found(&e) => Ok(None),
            other => other,
        }
    }

    async fn list(&self, _pattern: Option<&str>) -> DepotResult<Vec<String>> {
        Err(unsupported("list"))
    }

    async fn versions(&self, _name: &str) -> DepotResult<Vec<Version>> {
        Err(unsupported("versions"))
    }

    async fn store(&self, _artifact: &Artifact) -> DepotResult<PathBuf> {
        Err(DepotError::ReadOnlyRepository {
            name: Self::NAME.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_split_on_plus() {
        let c = coordinate("org.example+lib", Some("1.0")).unwrap();
        assert_eq!(c, Coordinate::new("org.example", "lib", "1.0"));
        assert!(coordinate("org.example:lib", Some("1.0")).is_err());
        assert!(coordinate("+lib", Some("1.0")).is_err());
    }

    #[test]
    fn versions_must_be_concrete() {
        assert!(coordinate("g+a", None).is_err());
        assert!(coordinate("g+a", Some("latest")).is_err());
        assert!(coordinate("g+a", Some("[1.0,2.0)")).is_err());
        assert!(coordinate("g+a", Some("1.0-SNAPSHOT")).is_ok());
    }
}
