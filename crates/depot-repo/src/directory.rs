//! A repository backed by a local directory tree.
//!
//! Layout: `<root>/<name>/<name>-<version>.<ext>` where `<version>` is a
//! concrete version or the literal `latest`, and `<ext>` is `jar` or `lib`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use globset::Glob;
use regex::Regex;

use depot_core::config::{DepotConfig, RepositoryEntry};
use depot_core::version::{Version, VersionRange, LATEST};
use depot_util::errors::{DepotError, DepotResult};
use depot_util::fs::{atomic_copy, ensure_dir, modified};

use crate::provider::{Artifact, Listeners, RepositoryListener, RepositoryProvider, Strategy};

static REPO_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-A-Za-z0-9_.]+)-([0-9.]+|latest)\.(jar|lib)$").expect("valid pattern")
});

static SYMBOLIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-A-Za-z0-9_]+(\.[-A-Za-z0-9_]+)*$").expect("valid pattern")
});

const EXTENSIONS: [&str; 2] = ["jar", "lib"];

/// A [`RepositoryProvider`] over `<root>/<name>/<name>-<version>.<ext>` files.
///
/// Supports one writer and any number of readers per instance; concurrent
/// `store` calls must be serialized by the caller.
#[derive(Debug)]
pub struct DirectoryRepository {
    name: String,
    root: PathBuf,
    can_write: bool,
    dirty: AtomicBool,
    listeners: Listeners,
}

/// One file found for a name.
#[derive(Debug, Clone)]
struct Entry {
    version: Version,
    path: PathBuf,
}

impl DirectoryRepository {
    /// Open the repository rooted at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> DepotResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DepotError::Config {
                message: format!("Repository is not a valid directory: {}", root.display()),
            }
            .into());
        }
        Ok(Self {
            name: root.display().to_string(),
            root,
            can_write: true,
            dirty: AtomicBool::new(false),
            listeners: Listeners::new(),
        })
    }

    /// Open a repository described by a `[[repository]]` config entry.
    pub fn from_entry(entry: &RepositoryEntry, config: &DepotConfig) -> DepotResult<Self> {
        Ok(Self::open(config.resolve_path(&entry.location))?
            .named(&entry.name)
            .read_only(entry.readonly))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn read_only(mut self, readonly: bool) -> Self {
        self.can_write = !readonly;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RepositoryListener>) -> Self {
        self.listeners.add(listener);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether anything was written since the previous call. Clears the flag.
    pub fn refresh(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// All files for `name`, ascending by version; the `latest` alias sorts last.
    fn scan(&self, name: &str) -> DepotResult<Vec<Entry>> {
        check_name(name)?;
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(&dir)
            .map_err(DepotError::Io)?
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| (e.file_name().to_string_lossy().to_string(), e.path()))
            .collect();
        // Deterministic pick when both `.jar` and `.lib` exist for one version.
        files.sort();

        let mut entries: Vec<Entry> = Vec::new();
        for (file_name, path) in files {
            let Some(caps) = REPO_FILE.captures(&file_name) else {
                continue;
            };
            if &caps[1] != name {
                continue;
            }
            let version = if &caps[2] == LATEST {
                Version::latest()
            } else {
                match Version::parse(&caps[2]) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!("Skipping {}: {e}", path.display());
                        continue;
                    }
                }
            };
            if entries.iter().any(|e| e.version == version) {
                continue;
            }
            entries.push(Entry { version, path });
        }

        entries.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(entries)
    }

    fn select(
        &self,
        name: &str,
        constraint: Option<&str>,
        strategy: Strategy,
    ) -> DepotResult<Option<PathBuf>> {
        let constraint = constraint.map(str::trim).filter(|c| !c.is_empty());

        if constraint == Some(LATEST) {
            let entries = self.scan(name)?;
            let newest = entries
                .iter()
                .rev()
                .find(|e| !e.version.is_latest())
                .or(entries.last());
            return Ok(newest.map(|e| e.path.clone()));
        }

        let range = match constraint {
            Some(c) => VersionRange::parse(c)?,
            None => VersionRange::any(),
        };

        let entries = self.scan(name)?;
        let mut candidates = entries
            .iter()
            .filter(|e| !e.version.is_latest() && range.includes(&e.version));

        let chosen = match strategy {
            Strategy::Lowest => candidates.next(),
            Strategy::Highest => candidates.last(),
            Strategy::Exact => {
                let Some(wanted) = range.single() else {
                    return Err(DepotError::InvalidRequest {
                        message: format!(
                            "EXACT needs a single version for {name}, got range {range}"
                        ),
                    }
                    .into());
                };
                candidates.find(|e| &e.version == wanted)
            }
        };
        Ok(chosen.map(|e| e.path.clone()))
    }

    fn write(&self, artifact: &Artifact) -> DepotResult<PathBuf> {
        if !self.can_write {
            return Err(DepotError::ReadOnlyRepository {
                name: self.name.clone(),
            }
            .into());
        }
        check_name(&artifact.name)?;
        if !EXTENSIONS.contains(&artifact.extension.as_str()) {
            return Err(DepotError::InvalidRequest {
                message: format!("unsupported artifact extension '{}'", artifact.extension),
            }
            .into());
        }

        let source_modified = artifact.modified().map_err(DepotError::Io)?;
        let dir = self.root.join(&artifact.name);
        ensure_dir(&dir).map_err(DepotError::Io)?;

        let file = dir.join(format!(
            "{}-{}.{}",
            artifact.name,
            artifact.version.without_qualifier(),
            artifact.extension
        ));
        match modified(&file).map_err(DepotError::Io)? {
            Some(existing) if existing >= source_modified => {
                tracing::info!(
                    "Did not update {} because the repository has a newer copy",
                    file.display()
                );
            }
            _ => {
                atomic_copy(&artifact.path, &file).map_err(DepotError::Io)?;
                self.dirty.store(true, Ordering::Release);
                tracing::info!("Updated {}", file.display());
                self.listeners.notify(self, artifact, &file);
            }
        }

        let alias = dir.join(format!("{}-{LATEST}.{}", artifact.name, artifact.extension));
        if let Some(alias_modified) = modified(&alias).map_err(DepotError::Io)? {
            if alias_modified < source_modified {
                atomic_copy(&artifact.path, &alias).map_err(DepotError::Io)?;
                self.dirty.store(true, Ordering::Release);
                tracing::debug!("Refreshed {}", alias.display());
            }
        }

        Ok(file)
    }
}

/// Names map to a directory under the root, so only dotted symbolic names pass.
fn check_name(name: &str) -> DepotResult<()> {
    if SYMBOLIC_NAME.is_match(name) {
        return Ok(());
    }
    Err(DepotError::InvalidRequest {
        message: format!("artifact name has wrong format: '{name}'"),
    }
    .into())
}

#[async_trait]
impl RepositoryProvider for DirectoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_write(&self) -> bool {
        self.can_write
    }

    async fn resolve(
        &self,
        name: &str,
        constraint: Option<&str>,
        strategy: Strategy,
    ) -> DepotResult<Option<PathBuf>> {
        self.select(name, constraint, strategy)
    }

    async fn list(&self, pattern: Option<&str>) -> DepotResult<Vec<String>> {
        let matcher = match pattern {
            Some(p) => Some(
                Glob::new(p)
                    .map_err(|e| DepotError::InvalidRequest {
                        message: format!("invalid pattern '{p}': {e}"),
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };

        let mut names: Vec<String> = std::fs::read_dir(&self.root)
            .map_err(DepotError::Io)?
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| matcher.as_ref().map_or(true, |m| m.is_match(n)))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn versions(&self, name: &str) -> DepotResult<Vec<Version>> {
        Ok(self.scan(name)?.into_iter().map(|e| e.version).collect())
    }

    async fn store(&self, artifact: &Artifact) -> DepotResult<PathBuf> {
        self.write(artifact)
    }
}

impl fmt::Display for DirectoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40} r/w={}",
            self.root.display().to_string(),
            self.can_write
        )
    }
}
