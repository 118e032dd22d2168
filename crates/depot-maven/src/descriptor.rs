//! POM parsing into [`ProjectDescriptor`]s.
//!
//! Only the parts resolution needs are read: identity (with `<parent>`
//! fallback for group and version), name, description, packaging,
//! `<properties>`, `<dependencies>` and `<dependencyManagement>` versions.
//! `${...}` references in dependency coordinates are interpolated here.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use depot_core::coordinate::{exclusion_key, Coordinate};
use depot_core::dependency::{Dependency, Scope};
use depot_core::descriptor::ProjectDescriptor;
use depot_util::errors::{DepotError, DepotResult};

/// Upper bound on nested `${...}` expansion rounds.
const MAX_INTERPOLATION_ROUNDS: usize = 20;

#[derive(Debug, Default)]
struct RawPom {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    packaging: Option<String>,
    name: Option<String>,
    description: Option<String>,
    parent_group_id: Option<String>,
    parent_version: Option<String>,
    properties: BTreeMap<String, String>,
    dependencies: Vec<RawDependency>,
    managed: Vec<RawDependency>,
}

#[derive(Debug, Default, Clone)]
struct RawDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    scope: Option<String>,
    kind: Option<String>,
    optional: bool,
    exclusions: Vec<(String, Option<String>)>,
}

impl RawPom {
    fn effective_group_id(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.parent_group_id.as_deref())
    }

    fn effective_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.parent_version.as_deref())
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(str::to_string),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(str::to_string),
            "project.parent.groupId" => self.parent_group_id.clone(),
            "project.parent.version" => self.parent_version.clone(),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Replace `${key}` references; unknown keys are left as written.
    fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        for _ in 0..MAX_INTERPOLATION_ROUNDS {
            if !result.contains("${") {
                break;
            }
            let mut out = String::with_capacity(result.len());
            let mut rest = result.as_str();
            while let Some(start) = rest.find("${") {
                let Some(len) = rest[start..].find('}') else {
                    break;
                };
                let key = &rest[start + 2..start + len];
                out.push_str(&rest[..start]);
                match self.resolve_property(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + len + 1]),
                }
                rest = &rest[start + len + 1..];
            }
            out.push_str(rest);
            if out == result {
                break;
            }
            result = out;
        }
        result
    }

    fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<String> {
        self.managed
            .iter()
            .find(|d| {
                self.interpolate(&d.group_id) == group_id
                    && self.interpolate(&d.artifact_id) == artifact_id
            })
            .and_then(|d| d.version.as_deref())
            .map(|v| self.interpolate(v))
    }

    fn into_descriptor(self) -> DepotResult<ProjectDescriptor> {
        let missing = |field: &str| DepotError::Parse {
            message: format!("descriptor has no <{field}>"),
        };
        let group_id = self
            .effective_group_id()
            .map(|g| self.interpolate(g))
            .ok_or_else(|| missing("groupId"))?;
        let artifact_id = self
            .artifact_id
            .as_deref()
            .map(|a| self.interpolate(a))
            .ok_or_else(|| missing("artifactId"))?;
        let version = self
            .effective_version()
            .map(|v| self.interpolate(v))
            .ok_or_else(|| missing("version"))?;

        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for raw in &self.dependencies {
            let group = self.interpolate(&raw.group_id);
            let artifact = self.interpolate(&raw.artifact_id);
            // An unmanaged dependency without a version keeps an empty one; the
            // fetch fails later only if resolution actually walks this edge.
            let dep_version = match &raw.version {
                Some(v) => self.interpolate(v),
                None => self.managed_version(&group, &artifact).unwrap_or_default(),
            };
            let scope: Scope = raw.scope.as_deref().unwrap_or_default().parse()?;

            let mut dep = Dependency::new(Coordinate::new(group, artifact, dep_version), scope)
                .optional(raw.optional);
            dep.kind = raw.kind.clone();
            for (group, artifact) in &raw.exclusions {
                dep.exclusions
                    .insert(exclusion_key(group, artifact.as_deref().unwrap_or("*")));
            }
            dependencies.push(dep);
        }

        Ok(ProjectDescriptor {
            group_id,
            artifact_id,
            version,
            packaging: self.packaging.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            dependencies,
        })
    }
}

/// Parse a POM XML string into a [`ProjectDescriptor`].
pub fn parse_descriptor(xml: &str) -> DepotResult<ProjectDescriptor> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = RawPom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut current_dep: Option<RawDependency> = None;
    let mut current_exclusion: Option<(String, Option<String>)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();

                match path_context(&path).as_str() {
                    "project>dependencies>dependency"
                    | "project>dependencyManagement>dependencies>dependency" => {
                        current_dep = Some(RawDependency::default());
                    }
                    ctx if ctx.ends_with(">exclusions>exclusion") && current_dep.is_some() => {
                        current_exclusion = Some((String::new(), None));
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e
                    .unescape()
                    .map_err(|err| DepotError::Parse {
                        message: format!("Failed to parse POM XML: {err}"),
                    })?
                    .to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let leaf = path.last().map(String::as_str);
                let value = text_buf.trim().to_string();

                if path.len() == 3 && path[1] == "properties" {
                    if let Some(key) = leaf {
                        pom.properties.insert(key.to_string(), value.clone());
                    }
                }

                if let Some(dep) = current_dep.as_mut() {
                    if let Some(excl) = current_exclusion.as_mut() {
                        match leaf {
                            Some("groupId") => excl.0 = value.clone(),
                            Some("artifactId") => excl.1 = Some(value.clone()),
                            _ => {}
                        }
                        if ctx.ends_with(">exclusions>exclusion") {
                            if let Some(excl) = current_exclusion.take() {
                                dep.exclusions.push(excl);
                            }
                        }
                    } else if ctx.contains(">dependency>") {
                        match leaf {
                            Some("groupId") => dep.group_id = value.clone(),
                            Some("artifactId") => dep.artifact_id = value.clone(),
                            Some("version") => dep.version = Some(value.clone()),
                            Some("scope") => dep.scope = Some(value.clone()),
                            Some("type") => dep.kind = Some(value.clone()),
                            Some("optional") => dep.optional = value.eq_ignore_ascii_case("true"),
                            _ => {}
                        }
                    }

                    if ctx == "project>dependencies>dependency" {
                        if let Some(dep) = current_dep.take() {
                            pom.dependencies.push(dep);
                        }
                    } else if ctx == "project>dependencyManagement>dependencies>dependency" {
                        if let Some(dep) = current_dep.take() {
                            pom.managed.push(dep);
                        }
                    }
                }

                match ctx.as_str() {
                    "project>groupId" => pom.group_id = Some(value),
                    "project>artifactId" => pom.artifact_id = Some(value),
                    "project>version" => pom.version = Some(value),
                    "project>packaging" => pom.packaging = Some(value),
                    "project>name" => pom.name = Some(value),
                    "project>description" => pom.description = Some(value),
                    "project>parent>groupId" => pom.parent_group_id = Some(value),
                    "project>parent>version" => pom.parent_version = Some(value),
                    _ => {}
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DepotError::Parse {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(DepotError::Parse {
            message: "document is not a complete <project>".to_string(),
        }
        .into());
    }

    pom.into_descriptor()
}

/// Read and parse a POM file.
pub fn parse_descriptor_file(path: &Path) -> DepotResult<ProjectDescriptor> {
    let xml = std::fs::read_to_string(path).map_err(DepotError::Io)?;
    tracing::debug!("Parsing {}", path.display());
    parse_descriptor(&xml)
}

fn path_context(path: &[String]) -> String {
    path.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>
    <name>My Library</name>
    <description>Does things</description>

    <properties>
        <slf4j.version>2.0.9</slf4j.version>
    </properties>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.junit</groupId>
                <artifactId>junit-bom</artifactId>
                <version>5.10.0</version>
            </dependency>
        </dependencies>
    </dependencyManagement>

    <dependencies>
        <dependency>
            <groupId>org.slf4j</groupId>
            <artifactId>slf4j-api</artifactId>
            <version>${slf4j.version}</version>
            <exclusions>
                <exclusion>
                    <groupId>org.bad</groupId>
                    <artifactId>bad-lib</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
        <dependency>
            <groupId>${project.groupId}</groupId>
            <artifactId>my-lib-extras</artifactId>
            <version>${project.version}</version>
            <scope>runtime</scope>
            <optional>true</optional>
        </dependency>
        <dependency>
            <groupId>org.junit</groupId>
            <artifactId>junit-bom</artifactId>
            <scope>test</scope>
            <type>pom</type>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parses_identity_and_metadata() {
        let d = parse_descriptor(SIMPLE_POM).unwrap();
        assert_eq!(d.coordinate(), Coordinate::new("org.example", "my-lib", "1.0.0"));
        assert_eq!(d.name.as_deref(), Some("My Library"));
        assert_eq!(d.description.as_deref(), Some("Does things"));
    }

    #[test]
    fn parses_dependencies_in_order() {
        let d = parse_descriptor(SIMPLE_POM).unwrap();
        assert_eq!(d.dependencies.len(), 3);

        let slf4j = &d.dependencies[0];
        assert_eq!(slf4j.coordinate, Coordinate::new("org.slf4j", "slf4j-api", "2.0.9"));
        assert_eq!(slf4j.scope, Scope::Compile);
        assert!(slf4j.excludes("org.bad+bad-lib"));

        let extras = &d.dependencies[1];
        assert_eq!(
            extras.coordinate,
            Coordinate::new("org.example", "my-lib-extras", "1.0.0")
        );
        assert_eq!(extras.scope, Scope::Runtime);
        assert!(extras.optional);

        let managed = &d.dependencies[2];
        assert_eq!(managed.coordinate.version, "5.10.0");
        assert_eq!(managed.kind.as_deref(), Some("pom"));
        assert_eq!(managed.scope, Scope::Test);
    }

    #[test]
    fn parent_supplies_group_and_version() {
        let xml = r#"<project>
            <parent><groupId>org.parent</groupId><artifactId>p</artifactId><version>3.1</version></parent>
            <artifactId>child</artifactId>
            <packaging>pom</packaging>
        </project>"#;
        let d = parse_descriptor(xml).unwrap();
        assert_eq!(d.coordinate(), Coordinate::new("org.parent", "child", "3.1"));
        assert!(!d.has_binary());
    }

    #[test]
    fn unknown_scope_is_parse_error() {
        let xml = r#"<project><groupId>g</groupId><artifactId>a</artifactId><version>1</version>
            <dependencies><dependency><groupId>x</groupId><artifactId>y</artifactId>
            <version>1</version><scope>sometimes</scope></dependency></dependencies></project>"#;
        let err = parse_descriptor(xml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DepotError>(),
            Some(DepotError::Parse { .. })
        ));
    }

    #[test]
    fn missing_identity_is_parse_error() {
        assert!(parse_descriptor("<project><groupId>g</groupId></project>").is_err());
        assert!(parse_descriptor("<project><groupId>g</groupId>").is_err());
        assert!(parse_descriptor("not xml at all <<<").is_err());
    }

    #[test]
    fn unresolved_property_is_left_verbatim() {
        let raw = RawPom::default();
        assert_eq!(raw.interpolate("${nope}-x"), "${nope}-x");
    }
}
