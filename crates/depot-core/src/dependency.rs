use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use depot_util::errors::DepotError;

use crate::coordinate::{exclusion_key, Coordinate};

const WILDCARD: &str = "*";

/// Maven-compatible dependency scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Provided,
    System,
    Import,
    Test,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::System => "system",
            Scope::Import => "import",
            Scope::Test => "test",
        }
    }
}

impl FromStr for Scope {
    type Err = DepotError;

    /// An empty string is the default `compile` scope.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "compile" => Ok(Scope::Compile),
            "runtime" => Ok(Scope::Runtime),
            "provided" => Ok(Scope::Provided),
            "system" => Ok(Scope::System),
            "import" => Ok(Scope::Import),
            "test" => Ok(Scope::Test),
            other => Err(DepotError::Parse {
                message: format!("unknown dependency scope '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dependency edge declared by a project descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    /// Declared packaging type (`jar`, `pom`, ...), if any.
    pub kind: Option<String>,
    /// `group+artifact` keys suppressed below this edge.
    pub exclusions: BTreeSet<String>,
}

impl Dependency {
    pub fn new(coordinate: Coordinate, scope: Scope) -> Self {
        Self {
            coordinate,
            scope,
            optional: false,
            kind: None,
            exclusions: BTreeSet::new(),
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn exclude(mut self, group_id: &str, artifact_id: &str) -> Self {
        self.exclusions.insert(exclusion_key(group_id, artifact_id));
        self
    }

    /// Whether this edge declares an exclusion for `key` (`group+artifact`).
    /// A `*` artifact or group in a declaration matches anything.
    pub fn excludes(&self, key: &str) -> bool {
        if self.exclusions.contains(key) {
            return true;
        }
        let Some((group, artifact)) = key.split_once('+') else {
            return false;
        };
        self.exclusions.contains(&exclusion_key(group, WILDCARD))
            || self.exclusions.contains(&exclusion_key(WILDCARD, artifact))
            || self.exclusions.contains(&exclusion_key(WILDCARD, WILDCARD))
    }

    pub fn name(&self) -> String {
        self.coordinate.name()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate, self.scope)?;
        if self.optional {
            f.write_str(" optional")?;
        }
        Ok(())
    }
}
