//! Remote repository locations and the Maven path layout within them.

use std::fmt;
use std::path::{Path, PathBuf};

use depot_core::config::RemoteEntry;
use depot_core::coordinate::Coordinate;

/// Where a remote repository lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// An `http://` or `https://` base URL, without a trailing slash.
    Http(String),
    /// A directory laid out like a Maven repository.
    Directory(PathBuf),
}

/// One configured remote with optional credentials.
#[derive(Debug, Clone)]
pub struct RemoteRepository {
    pub name: String,
    pub location: Location,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RemoteRepository {
    /// Interpret `spec` as a URL or a path. Relative paths resolve against `base_dir`.
    pub fn new(name: impl Into<String>, spec: &str, base_dir: &Path) -> Self {
        let spec = spec.trim();
        let location = if spec.starts_with("http://") || spec.starts_with("https://") {
            Location::Http(spec.trim_end_matches('/').to_string())
        } else {
            let raw = spec.strip_prefix("file://").unwrap_or(spec);
            let path = Path::new(raw);
            if path.is_absolute() {
                Location::Directory(path.to_path_buf())
            } else {
                Location::Directory(base_dir.join(path))
            }
        };
        Self {
            name: name.into(),
            location,
            username: None,
            password: None,
        }
    }

    /// Build a remote from a `[[remote]]` config entry.
    pub fn from_entry(entry: &RemoteEntry, base_dir: &Path) -> Self {
        let mut repo = Self::new(&entry.name, &entry.url, base_dir);
        repo.username = entry.username.clone();
        repo.password = entry.password.clone();
        repo
    }

    /// Standard Maven layout directory for a coordinate.
    ///
    /// `org.slf4j:slf4j-api:2.0.9` becomes `org/slf4j/slf4j-api/2.0.9`
    pub fn coordinate_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}",
            coordinate.group_id.replace('.', "/"),
            coordinate.artifact_id,
            coordinate.version
        )
    }

    /// Relative path of the descriptor (`.pom`) for a coordinate.
    pub fn descriptor_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}-{}.pom",
            Self::coordinate_path(coordinate),
            coordinate.artifact_id,
            coordinate.version
        )
    }

    /// Relative path of the binary artifact (`.jar`) for a coordinate.
    pub fn artifact_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}-{}.jar",
            Self::coordinate_path(coordinate),
            coordinate.artifact_id,
            coordinate.version
        )
    }
}

impl fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::Http(url) => write!(f, "{} ({url})", self.name),
            Location::Directory(dir) => write!(f, "{} ({})", self.name, dir.display()),
        }
    }
}
