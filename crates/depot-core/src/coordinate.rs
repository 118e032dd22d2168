use std::fmt;

use serde::{Deserialize, Serialize};

use depot_util::errors::DepotError;

/// `(group, artifact, version)` identity of an artifact.
///
/// Equality and hashing are structural, so two coordinates parsed from
/// different descriptors compare equal when their fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:artifact:version"` into coordinates.
    pub fn parse(s: &str) -> Result<Self, DepotError> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => {
                Ok(Self::new(*g, *a, *v))
            }
            _ => Err(DepotError::Parse {
                message: format!("expected 'group:artifact:version', got '{s}'"),
            }),
        }
    }

    /// Version-independent `group+artifact` key used by exclusions and listings.
    pub fn name(&self) -> String {
        exclusion_key(&self.group_id, &self.artifact_id)
    }

    /// One line of a library listing: `group+artifact;version="x.y.z"`.
    pub fn listing_entry(&self) -> String {
        format!("{};version=\"{}\"", self.name(), self.version)
    }
}

/// Build the `group+artifact` key for a pair of ids.
pub fn exclusion_key(group_id: &str, artifact_id: &str) -> String {
    format!("{group_id}+{artifact_id}")
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
