use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use depot_util::errors::DepotError;

/// Name of the configuration file looked up from the working directory.
pub const CONFIG_FILE: &str = "depot.toml";

/// Maven Central base URL, used when no `[[remote]]` is configured.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Configuration loaded from `depot.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepotConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    /// Remote locations in lookup order.
    #[serde(default)]
    pub remote: Vec<RemoteEntry>,

    /// Local directory repositories.
    #[serde(default)]
    pub repository: Vec<RepositoryEntry>,

    /// Directory the file was loaded from; relative paths resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Local cache settings from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    ".depot/cache".to_string()
}

/// Fetch settings from `[fetch]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_concurrency() -> usize {
    8
}

/// A `[[remote]]` entry: one base location of a Maven-layout repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    /// `http(s)://` URL, `file://` URL, or a filesystem path.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A `[[repository]]` entry: a local directory repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub readonly: bool,
}

impl DepotConfig {
    /// Parse configuration text. Relative paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, DepotError> {
        let mut config: DepotConfig = toml::from_str(content).map_err(|e| DepotError::Config {
            message: format!("Failed to parse {CONFIG_FILE}: {e}"),
        })?;
        config.base_dir = base_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file.
    pub fn load(path: &Path) -> Result<Self, DepotError> {
        let content = std::fs::read_to_string(path).map_err(|e| DepotError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base)
    }

    /// Find `depot.toml` in `start` or an ancestor, or fall back to defaults
    /// rooted at `start`.
    pub fn discover(start: &Path) -> Result<Self, DepotError> {
        match depot_util::fs::find_ancestor_with(start, CONFIG_FILE) {
            Some(dir) => Self::load(&dir.join(CONFIG_FILE)),
            None => Ok(Self {
                base_dir: start.to_path_buf(),
                ..Self::default()
            }),
        }
    }

    fn validate(&self) -> Result<(), DepotError> {
        for remote in &self.remote {
            if remote.name.trim().is_empty() || remote.url.trim().is_empty() {
                return Err(DepotError::Config {
                    message: "every [[remote]] needs a non-empty name and url".to_string(),
                });
            }
        }
        for repo in &self.repository {
            if repo.name.trim().is_empty() || repo.location.trim().is_empty() {
                return Err(DepotError::Config {
                    message: "every [[repository]] needs a non-empty name and location"
                        .to_string(),
                });
            }
        }
        if self.fetch.concurrency == 0 {
            return Err(DepotError::Config {
                message: "fetch.concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a possibly relative path against the config directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.resolve_path(&self.cache.dir)
    }

    /// Configured remotes, or Maven Central when none are listed.
    pub fn remotes(&self) -> Vec<RemoteEntry> {
        if self.remote.is_empty() {
            vec![RemoteEntry {
                name: "central".to_string(),
                url: MAVEN_CENTRAL_URL.to_string(),
                username: None,
                password: None,
            }]
        } else {
            self.remote.clone()
        }
    }

    pub fn repository(&self, name: &str) -> Option<&RepositoryEntry> {
        self.repository.iter().find(|r| r.name == name)
    }
}
