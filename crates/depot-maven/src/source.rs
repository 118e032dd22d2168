//! Cache-and-fetch front for descriptors and binaries.
//!
//! [`ArtifactSource`] checks the [`LocalCache`] first, then asks each remote
//! in order; the first remote that has a coordinate wins. Every coordinate is
//! fetched at most once per source, even under concurrent callers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use depot_core::config::DepotConfig;
use depot_core::coordinate::Coordinate;
use depot_core::descriptor::ProjectDescriptor;
use depot_util::errors::{DepotError, DepotResult};

use crate::cache::LocalCache;
use crate::descriptor::{parse_descriptor, parse_descriptor_file};
use crate::remote::RemoteRepository;
use crate::transport::{DefaultTransport, Transport};

/// A descriptor that has been fetched and cached locally.
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub coordinate: Coordinate,
    pub descriptor: Arc<ProjectDescriptor>,
    /// Location of the cached descriptor file.
    pub descriptor_path: PathBuf,
    /// Remote that served the descriptor; `None` when it came from the cache.
    pub origin: Option<String>,
}

/// Turns coordinates into parsed descriptors and binary files.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Fails with [`DepotError::NotFound`] when no location has the coordinate.
    async fn fetch(&self, coordinate: &Coordinate) -> DepotResult<Arc<FetchedArtifact>>;

    /// Binary for a coordinate, downloaded on first use.
    /// `None` for descriptors without a binary (`pom` packaging).
    async fn artifact(&self, coordinate: &Coordinate) -> DepotResult<Option<PathBuf>>;
}

type Slot = Arc<OnceCell<Arc<FetchedArtifact>>>;

pub struct ArtifactSource<T = DefaultTransport> {
    cache: LocalCache,
    remotes: Vec<RemoteRepository>,
    transport: T,
    timeout: Duration,
    entries: Mutex<HashMap<Coordinate, Slot>>,
}

impl ArtifactSource<DefaultTransport> {
    /// Build a source from `depot.toml`: cache directory, remotes and fetch timeout.
    pub fn from_config(config: &DepotConfig) -> DepotResult<Self> {
        let remotes = config
            .remotes()
            .iter()
            .map(|entry| RemoteRepository::from_entry(entry, &config.base_dir))
            .collect();
        Ok(Self::new(
            LocalCache::new(config.cache_dir()),
            remotes,
            DefaultTransport::new()?,
        )
        .with_timeout(config.fetch.timeout()))
    }
}

impl<T: Transport> ArtifactSource<T> {
    pub fn new(cache: LocalCache, remotes: Vec<RemoteRepository>, transport: T) -> Self {
        Self {
            cache,
            remotes,
            transport,
            timeout: Duration::from_secs(120),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Upper bound on a single fetch, including retries across remotes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn remotes(&self) -> &[RemoteRepository] {
        &self.remotes
    }

    fn slot(&self, coordinate: &Coordinate) -> Slot {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.entry(coordinate.clone()).or_default().clone()
    }

    async fn bounded<F, R>(&self, coordinate: &Coordinate, fut: F) -> DepotResult<R>
    where
        F: std::future::Future<Output = DepotResult<R>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DepotError::Network {
                message: format!(
                    "Timed out after {}s fetching {coordinate}",
                    self.timeout.as_secs_f32()
                ),
            }
            .into()),
        }
    }

    async fn load(&self, coordinate: &Coordinate) -> DepotResult<Arc<FetchedArtifact>> {
        if let Some(path) = self.cache.get_descriptor(coordinate) {
            tracing::debug!("Cache hit for {coordinate}");
            let descriptor = parse_descriptor_file(&path)?;
            return Ok(Arc::new(FetchedArtifact {
                coordinate: coordinate.clone(),
                descriptor: Arc::new(descriptor),
                descriptor_path: path,
                origin: None,
            }));
        }

        let relative = RemoteRepository::descriptor_path(coordinate);
        let (remote, bytes) = self.first_remote_with(coordinate, &relative, None).await?;

        let xml = String::from_utf8(bytes).map_err(|e| DepotError::Parse {
            message: format!("descriptor for {coordinate} is not UTF-8: {e}"),
        })?;
        let descriptor = parse_descriptor(&xml)?;
        let path = self.cache.put_descriptor(coordinate, xml.as_bytes())?;
        tracing::info!("Fetched {coordinate} from {}", remote.name);

        Ok(Arc::new(FetchedArtifact {
            coordinate: coordinate.clone(),
            descriptor: Arc::new(descriptor),
            descriptor_path: path,
            origin: Some(remote.name.clone()),
        }))
    }

    /// Ask remotes in order for `relative`. `only` restricts the search to one
    /// remote by name. A failing remote is logged and the next one is tried.
    async fn first_remote_with(
        &self,
        coordinate: &Coordinate,
        relative: &str,
        only: Option<&str>,
    ) -> DepotResult<(&RemoteRepository, Vec<u8>)> {
        let mut last_err = None;
        for remote in &self.remotes {
            if only.is_some_and(|name| name != remote.name) {
                continue;
            }
            match self.transport.get(remote, relative).await {
                Ok(Some(bytes)) => return Ok((remote, bytes)),
                Ok(None) => tracing::debug!("{relative} not in {remote}"),
                Err(e) => {
                    tracing::warn!("{remote} failed for {coordinate}: {e}");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Err(DepotError::NotFound {
                what: format!("{relative} in any configured remote"),
            }
            .into()),
        }
    }
}

#[async_trait]
impl<T: Transport> DescriptorSource for ArtifactSource<T> {
    async fn fetch(&self, coordinate: &Coordinate) -> DepotResult<Arc<FetchedArtifact>> {
        let slot = self.slot(coordinate);
        let fetched = slot
            .get_or_try_init(|| self.bounded(coordinate, self.load(coordinate)))
            .await?;
        Ok(fetched.clone())
    }

    async fn artifact(&self, coordinate: &Coordinate) -> DepotResult<Option<PathBuf>> {
        let fetched = self.fetch(coordinate).await?;
        if !fetched.descriptor.has_binary() {
            return Ok(None);
        }
        if let Some(path) = self.cache.get_artifact(coordinate) {
            return Ok(Some(path));
        }

        let relative = RemoteRepository::artifact_path(coordinate);
        let (remote, bytes) = self
            .bounded(
                coordinate,
                self.first_remote_with(coordinate, &relative, fetched.origin.as_deref()),
            )
            .await?;
        let path = self.cache.put_artifact(coordinate, &bytes)?;
        tracing::info!("Downloaded {} from {}", relative, remote.name);
        Ok(Some(path))
    }
}
