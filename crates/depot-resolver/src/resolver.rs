//! Transitive dependency resolution: breadth-first walk with scope filtering,
//! exclusions, optional-dependency pruning and per-coordinate deduplication.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use depot_core::coordinate::Coordinate;
use depot_core::dependency::{Dependency, Scope};
use depot_core::descriptor::ProjectDescriptor;
use depot_maven::source::{DescriptorSource, FetchedArtifact};
use depot_util::errors::{DepotError, DepotResult};

use crate::listing;

pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Descriptors reached by one resolution, in first-seen order, without duplicates.
#[derive(Debug, Default, Clone)]
pub struct ResolvedSet {
    entries: Vec<Arc<ProjectDescriptor>>,
    seen: HashSet<Coordinate>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `descriptor` unless its coordinate is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, descriptor: Arc<ProjectDescriptor>) -> bool {
        if !self.seen.insert(descriptor.coordinate()) {
            return false;
        }
        self.entries.push(descriptor);
        true
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.seen.contains(coordinate)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ProjectDescriptor>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.entries.iter().map(|d| d.coordinate()).collect()
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a Arc<ProjectDescriptor>;
    type IntoIter = std::slice::Iter<'a, Arc<ProjectDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Pending dependency plus the edges walked from the root to reach it.
struct FrontierEntry {
    /// Root-first. Shared by all children of one node.
    chain: Arc<[Dependency]>,
    dependency: Dependency,
}

/// Whether `key` (`group+artifact`) is excluded under `chain`.
///
/// Excluded when some ancestor declares the exclusion and so does every edge
/// between it and the root, i.e. the run of declaring edges starts at the root.
pub fn is_excluded(chain: &[Dependency], key: &str) -> bool {
    chain.iter().take_while(|edge| edge.excludes(key)).next().is_some()
}

pub struct DependencyResolver {
    source: Arc<dyn DescriptorSource>,
    concurrency: usize,
}

impl DependencyResolver {
    pub fn new(source: Arc<dyn DescriptorSource>) -> Self {
        Self {
            source,
            concurrency: MAX_CONCURRENT_FETCHES,
        }
    }

    /// Maximum descriptor fetches in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve everything `root` needs under `scope`.
    ///
    /// Only non-optional edges whose scope equals `scope` are followed. Fails
    /// on the first descriptor that cannot be fetched.
    pub async fn resolve(&self, root: &ProjectDescriptor, scope: Scope) -> DepotResult<ResolvedSet> {
        let root_coordinate = root.coordinate();
        let mut resolved = ResolvedSet::new();
        let empty: Arc<[Dependency]> = Arc::from(Vec::new());
        let mut frontier: VecDeque<FrontierEntry> = root
            .dependencies
            .iter()
            .map(|dependency| FrontierEntry {
                chain: empty.clone(),
                dependency: dependency.clone(),
            })
            .collect();

        tracing::debug!(
            "Resolving {root_coordinate} ({scope}) with {} direct dependencies",
            frontier.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        while !frontier.is_empty() {
            // Everything queued now is one breadth level; children go to the next.
            let level: Vec<FrontierEntry> = frontier
                .drain(..)
                .filter(|entry| accepts(entry, scope))
                .collect();

            let (fetched, mut failures) = self.prefetch(&level, &semaphore).await;

            for entry in level {
                let coordinate = &entry.dependency.coordinate;
                let Some(artifact) = fetched.get(coordinate) else {
                    let reason = failures
                        .remove(coordinate)
                        .unwrap_or_else(|| "fetch did not complete".to_string());
                    return Err(resolution_failure(&root_coordinate, &entry, reason));
                };

                let descriptor = artifact.descriptor.clone();
                if !resolved.insert(descriptor.clone()) {
                    tracing::trace!("{} already resolved", descriptor.coordinate());
                    continue;
                }

                let chain: Arc<[Dependency]> = entry
                    .chain
                    .iter()
                    .cloned()
                    .chain(std::iter::once(entry.dependency.clone()))
                    .collect();
                frontier.extend(descriptor.dependencies.iter().map(|dependency| FrontierEntry {
                    chain: chain.clone(),
                    dependency: dependency.clone(),
                }));
            }
        }

        tracing::debug!("Resolved {} artifacts for {root_coordinate}", resolved.len());
        Ok(resolved)
    }

    /// Fetch every distinct coordinate of a level in parallel.
    async fn prefetch(
        &self,
        level: &[FrontierEntry],
        semaphore: &Arc<Semaphore>,
    ) -> (
        HashMap<Coordinate, Arc<FetchedArtifact>>,
        HashMap<Coordinate, String>,
    ) {
        let coordinates: HashSet<Coordinate> = level
            .iter()
            .map(|entry| entry.dependency.coordinate.clone())
            .collect();

        let mut join_set = JoinSet::new();
        for coordinate in coordinates {
            let source = self.source.clone();
            let sem = semaphore.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let result = source.fetch(&coordinate).await;
                (coordinate, result)
            });
        }

        let mut fetched = HashMap::new();
        let mut failures = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((coordinate, Ok(artifact))) => {
                    fetched.insert(coordinate, artifact);
                }
                Ok((coordinate, Err(e))) => {
                    tracing::debug!("Fetching {coordinate} failed: {e}");
                    failures.insert(coordinate, e.to_string());
                }
                Err(e) => tracing::warn!("Fetch task failed: {e}"),
            }
        }
        (fetched, failures)
    }

    /// Path of the `<scope>.lib` listing for a descriptor stored at `descriptor_path`,
    /// regenerating it when the descriptor is newer than the listing.
    ///
    /// The first line is `root` itself, followed by one line per resolved artifact.
    pub async fn library(
        &self,
        root: &ProjectDescriptor,
        descriptor_path: &Path,
        scope: Scope,
    ) -> DepotResult<PathBuf> {
        let path = listing::listing_path(descriptor_path, scope);
        if listing::is_fresh(&path, descriptor_path)? {
            tracing::debug!("Reusing {}", path.display());
            return Ok(path);
        }

        let resolved = self.resolve(root, scope).await?;
        listing::write(&path, &root.coordinate(), &resolved)?;
        tracing::info!("Wrote {} ({} entries)", path.display(), resolved.len());
        Ok(path)
    }
}

fn accepts(entry: &FrontierEntry, scope: Scope) -> bool {
    let dependency = &entry.dependency;
    if is_excluded(&entry.chain, &dependency.name()) {
        tracing::debug!("{dependency} excluded");
        return false;
    }
    if dependency.optional {
        tracing::trace!("{dependency} skipped: optional");
        return false;
    }
    dependency.scope == scope
}

fn resolution_failure(root: &Coordinate, entry: &FrontierEntry, reason: String) -> miette::Report {
    let chain = std::iter::once(root.to_string())
        .chain(entry.chain.iter().map(|edge| edge.coordinate.to_string()))
        .chain(std::iter::once(entry.dependency.coordinate.to_string()))
        .collect();
    DepotError::ResolutionFailure {
        coordinate: entry.dependency.coordinate.to_string(),
        chain,
        reason,
    }
    .into()
}
