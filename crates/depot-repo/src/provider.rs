//! The pluggable repository contract and the types that flow through it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use depot_core::version::Version;
use depot_util::errors::{DepotError, DepotResult};

/// Version selection policy when several versions satisfy a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Highest,
    Lowest,
    /// The constraint must name one concrete version.
    Exact,
}

impl FromStr for Strategy {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "highest" => Ok(Strategy::Highest),
            "lowest" => Ok(Strategy::Lowest),
            "exact" => Ok(Strategy::Exact),
            other => Err(DepotError::Parse {
                message: format!("unknown strategy '{other}' (expected highest, lowest or exact)"),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Highest => "highest",
            Strategy::Lowest => "lowest",
            Strategy::Exact => "exact",
        })
    }
}

/// An artifact file on disk, offered to a repository for storage.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub version: Version,
    /// `jar` or `lib`.
    pub extension: String,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, version: Version, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version,
            extension: "jar".to_string(),
            path: path.into(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Modification time of the source file.
    pub fn modified(&self) -> std::io::Result<SystemTime> {
        std::fs::metadata(&self.path)?.modified()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// A backend that can look up, enumerate and (optionally) store artifacts.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn can_write(&self) -> bool;

    /// Pick one artifact for `name` under `constraint` (a range string, a
    /// single version, or the alias `"latest"`; `None` means any version).
    ///
    /// `Ok(None)` means nothing satisfies the request; errors are reserved for
    /// malformed or inconsistent requests and backend failures.
    async fn resolve(
        &self,
        name: &str,
        constraint: Option<&str>,
        strategy: Strategy,
    ) -> DepotResult<Option<PathBuf>>;

    /// Names in this repository, optionally filtered by a glob pattern.
    async fn list(&self, pattern: Option<&str>) -> DepotResult<Vec<String>>;

    /// Available versions for `name`, ascending.
    async fn versions(&self, name: &str) -> DepotResult<Vec<Version>>;

    /// Store `artifact`, returning where it now lives.
    async fn store(&self, artifact: &Artifact) -> DepotResult<PathBuf>;
}

/// Observer notified after an artifact has been written to a repository.
pub trait RepositoryListener: Send + Sync {
    fn artifact_added(
        &self,
        repository: &dyn RepositoryProvider,
        artifact: &Artifact,
        location: &Path,
    ) -> DepotResult<()>;
}

/// Registered listeners, invoked in registration order.
#[derive(Clone, Default)]
pub struct Listeners {
    listeners: Vec<Arc<dyn RepositoryListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Arc<dyn RepositoryListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener. Failures and panics are logged, never returned.
    pub fn notify(&self, repository: &dyn RepositoryProvider, artifact: &Artifact, location: &Path) {
        for listener in &self.listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                listener.artifact_added(repository, artifact, location)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    "Repository listener failed for {artifact} in {}: {e}",
                    repository.name()
                ),
                Err(_) => tracing::warn!(
                    "Repository listener panicked for {artifact} in {}",
                    repository.name()
                ),
            }
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
