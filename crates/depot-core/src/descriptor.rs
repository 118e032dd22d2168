use std::fmt;

use crate::coordinate::Coordinate;
use crate::dependency::Dependency;

/// A parsed project descriptor: identity, metadata and declared dependencies.
///
/// Descriptors are produced by the descriptor parser; resolution only reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<Dependency>,
}

impl ProjectDescriptor {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            group_id: coordinate.group_id,
            artifact_id: coordinate.artifact_id,
            version: coordinate.version,
            ..Self::default()
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.group_id, &self.artifact_id, &self.version)
    }

    /// Whether a binary artifact accompanies this descriptor.
    pub fn has_binary(&self) -> bool {
        self.packaging.as_deref() != Some("pom")
    }
}

impl fmt::Display for ProjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}-{}", self.group_id, self.artifact_id, self.version)
    }
}
