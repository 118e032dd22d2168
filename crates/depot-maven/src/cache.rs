//! Local artifact cache mirroring the Maven repository layout.

use std::path::{Path, PathBuf};

use depot_core::coordinate::Coordinate;
use depot_util::errors::{DepotError, DepotResult};
use depot_util::fs::atomic_write;

use crate::remote::RemoteRepository;

/// Descriptors and binaries fetched from remotes, stored at
/// `<root>/<group as path>/<artifact>/<version>/`.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(RemoteRepository::descriptor_path(coordinate))
    }

    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(RemoteRepository::artifact_path(coordinate))
    }

    /// Path of the cached descriptor, if present.
    pub fn get_descriptor(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.descriptor_path(coordinate);
        path.is_file().then_some(path)
    }

    /// Path of the cached binary, if present.
    pub fn get_artifact(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.artifact_path(coordinate);
        path.is_file().then_some(path)
    }

    pub fn put_descriptor(&self, coordinate: &Coordinate, data: &[u8]) -> DepotResult<PathBuf> {
        self.put(self.descriptor_path(coordinate), data)
    }

    pub fn put_artifact(&self, coordinate: &Coordinate, data: &[u8]) -> DepotResult<PathBuf> {
        self.put(self.artifact_path(coordinate), data)
    }

    fn put(&self, path: PathBuf, data: &[u8]) -> DepotResult<PathBuf> {
        atomic_write(&path, data).map_err(DepotError::Io)?;
        tracing::debug!("Cached {}", path.display());
        Ok(path)
    }
}
