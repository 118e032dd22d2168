use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use depot_core::coordinate::Coordinate;
use depot_core::dependency::{Dependency, Scope};
use depot_core::descriptor::ProjectDescriptor;
use depot_maven::source::{DescriptorSource, FetchedArtifact};
use depot_resolver::resolver::DependencyResolver;
use depot_util::errors::{DepotError, DepotResult};

fn coord(artifact: &str) -> Coordinate {
    Coordinate::new("com.acme", artifact, "1.0")
}

fn dep(artifact: &str) -> Dependency {
    Dependency::new(coord(artifact), Scope::Compile)
}

/// Descriptors held in memory, keyed by coordinate.
#[derive(Default)]
struct MapSource {
    descriptors: HashMap<Coordinate, Arc<ProjectDescriptor>>,
}

impl MapSource {
    fn with(mut self, artifact: &str, dependencies: Vec<Dependency>) -> Self {
        let mut descriptor = ProjectDescriptor::new(coord(artifact));
        descriptor.dependencies = dependencies;
        self.descriptors.insert(coord(artifact), Arc::new(descriptor));
        self
    }
}

#[async_trait]
impl DescriptorSource for MapSource {
    async fn fetch(&self, coordinate: &Coordinate) -> DepotResult<Arc<FetchedArtifact>> {
        let descriptor = self
            .descriptors
            .get(coordinate)
            .cloned()
            .ok_or_else(|| DepotError::NotFound {
                what: coordinate.to_string(),
            })?;
        Ok(Arc::new(FetchedArtifact {
            coordinate: coordinate.clone(),
            descriptor,
            descriptor_path: PathBuf::from("/nonexistent"),
            origin: None,
        }))
    }

    async fn artifact(&self, _coordinate: &Coordinate) -> DepotResult<Option<PathBuf>> {
        Ok(None)
    }
}

fn root(dependencies: Vec<Dependency>) -> ProjectDescriptor {
    let mut descriptor = ProjectDescriptor::new(coord("root"));
    descriptor.dependencies = dependencies;
    descriptor
}

async fn resolve(source: MapSource, root: &ProjectDescriptor, scope: Scope) -> Vec<String> {
    DependencyResolver::new(Arc::new(source))
        .resolve(root, scope)
        .await
        .unwrap()
        .iter()
        .map(|d| d.artifact_id.clone())
        .collect()
}

#[tokio::test]
async fn test_compile_scope_follows_compile_edges_in_discovery_order() {
    let source = MapSource::default()
        .with("a", vec![dep("c")])
        .with("b", vec![])
        .with("c", vec![]);
    let root = root(vec![
        dep("a"),
        Dependency::new(coord("b"), Scope::Test),
    ]);

    assert_eq!(resolve(source, &root, Scope::Compile).await, ["a", "c"]);
}

#[tokio::test]
async fn test_other_scopes_follow_only_matching_edges() {
    let source = MapSource::default()
        .with("t", vec![Dependency::new(coord("u"), Scope::Test), dep("v")])
        .with("u", vec![])
        .with("v", vec![]);
    let root = root(vec![Dependency::new(coord("t"), Scope::Test), dep("w")]);

    assert_eq!(resolve(source, &root, Scope::Test).await, ["t", "u"]);
}

#[tokio::test]
async fn test_diamond_is_resolved_once() {
    let source = MapSource::default()
        .with("a", vec![dep("d")])
        .with("b", vec![dep("d")])
        .with("d", vec![dep("e")])
        .with("e", vec![]);
    let root = root(vec![dep("a"), dep("b")]);

    assert_eq!(
        resolve(source, &root, Scope::Compile).await,
        ["a", "b", "d", "e"]
    );
}

#[tokio::test]
async fn test_cycles_terminate() {
    let source = MapSource::default()
        .with("a", vec![dep("b")])
        .with("b", vec![dep("a"), dep("root")])
        .with("root", vec![dep("a")]);
    let root = root(vec![dep("a")]);

    assert_eq!(
        resolve(source, &root, Scope::Compile).await,
        ["a", "b", "root"]
    );
}

#[tokio::test]
async fn test_optional_dependencies_are_never_followed() {
    let source = MapSource::default()
        .with("a", vec![dep("x").optional(true), dep("y")])
        .with("y", vec![]);
    let root = root(vec![dep("a"), dep("z").optional(true)]);

    assert_eq!(resolve(source, &root, Scope::Compile).await, ["a", "y"]);
}

#[tokio::test]
async fn test_exclusion_on_direct_dependency_prunes_its_subtree() {
    let source = || {
        MapSource::default()
            .with("a", vec![dep("x")])
            .with("b", vec![dep("x")])
            .with("x", vec![dep("y")])
            .with("y", vec![])
    };

    let excluded_only = root(vec![dep("a").exclude("com.acme", "x")]);
    assert_eq!(resolve(source(), &excluded_only, Scope::Compile).await, ["a"]);

    // A sibling reaching x without an exclusion still pulls it in.
    let with_sibling = root(vec![dep("a").exclude("com.acme", "x"), dep("b")]);
    assert_eq!(
        resolve(source(), &with_sibling, Scope::Compile).await,
        ["a", "b", "x", "y"]
    );
}

#[tokio::test]
async fn test_exclusion_reaches_deeper_levels_from_the_root_edge() {
    let source = MapSource::default()
        .with("a", vec![dep("b")])
        .with("b", vec![dep("x")])
        .with("x", vec![]);
    let root = root(vec![dep("a").exclude("com.acme", "x")]);

    assert_eq!(resolve(source, &root, Scope::Compile).await, ["a", "b"]);
}

#[tokio::test]
async fn test_exclusion_declared_only_below_the_root_edge_does_not_apply() {
    // Under "any ancestor excludes" x would be dropped; here the declaring
    // edge (a -> b) is not connected to the root by declaring edges.
    let source = MapSource::default()
        .with("a", vec![dep("b").exclude("com.acme", "x")])
        .with("b", vec![dep("x")])
        .with("x", vec![]);
    let root = root(vec![dep("a")]);

    assert_eq!(
        resolve(source, &root, Scope::Compile).await,
        ["a", "b", "x"]
    );
}

#[tokio::test]
async fn test_exclusion_declared_on_every_edge_applies() {
    let source = MapSource::default()
        .with("a", vec![dep("b").exclude("com.acme", "x")])
        .with("b", vec![dep("x")])
        .with("x", vec![]);
    let root = root(vec![dep("a").exclude("com.acme", "x")]);

    assert_eq!(resolve(source, &root, Scope::Compile).await, ["a", "b"]);
}

#[tokio::test]
async fn test_missing_descriptor_fails_with_chain() {
    let source = MapSource::default()
        .with("a", vec![dep("b")])
        .with("b", vec![dep("missing")]);
    let root = root(vec![dep("a")]);

    let err = DependencyResolver::new(Arc::new(source))
        .resolve(&root, Scope::Compile)
        .await
        .unwrap_err();

    match err.downcast_ref::<DepotError>() {
        Some(DepotError::ResolutionFailure {
            coordinate, chain, ..
        }) => {
            assert_eq!(coordinate, "com.acme:missing:1.0");
            assert_eq!(
                chain,
                &[
                    "com.acme:root:1.0",
                    "com.acme:a:1.0",
                    "com.acme:b:1.0",
                    "com.acme:missing:1.0"
                ]
            );
        }
        other => panic!("expected ResolutionFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_descriptor_on_skipped_edge_is_harmless() {
    let source = MapSource::default().with("a", vec![]);
    let root = root(vec![
        dep("a"),
        Dependency::new(coord("missing"), Scope::Test),
        dep("gone").optional(true),
    ]);

    assert_eq!(resolve(source, &root, Scope::Compile).await, ["a"]);
}

#[tokio::test]
async fn test_single_fetch_slot_still_resolves_everything() {
    let source = MapSource::default()
        .with("a", vec![dep("c")])
        .with("b", vec![dep("c")])
        .with("c", vec![]);
    let root = root(vec![dep("a"), dep("b")]);

    let resolved = DependencyResolver::new(Arc::new(source))
        .with_concurrency(1)
        .resolve(&root, Scope::Compile)
        .await
        .unwrap();
    assert_eq!(
        resolved.coordinates(),
        vec![coord("a"), coord("b"), coord("c")]
    );
}
