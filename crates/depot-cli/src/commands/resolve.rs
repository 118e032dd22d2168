//! Handler for `depot resolve`.

use std::path::Path;
use std::sync::Arc;

use miette::Result;

use depot_core::config::DepotConfig;
use depot_core::dependency::Scope;
use depot_maven::descriptor::parse_descriptor_file;
use depot_maven::source::ArtifactSource;
use depot_resolver::resolver::DependencyResolver;
use depot_util::errors::DepotError;
use depot_util::status::status;

pub async fn exec(config: &DepotConfig, descriptor: &Path, scope: &str, json: bool) -> Result<()> {
    let scope: Scope = scope.parse()?;
    let root = parse_descriptor_file(descriptor)?;

    let source = ArtifactSource::from_config(config)?;
    let resolver =
        DependencyResolver::new(Arc::new(source)).with_concurrency(config.fetch.concurrency);
    let resolved = resolver.resolve(&root, scope).await?;

    if json {
        println!("{}", json_output(serde_json::to_string_pretty(&resolved.coordinates()))?);
        return Ok(());
    }

    for coordinate in resolved.coordinates() {
        println!("{coordinate}");
    }
    status(
        "Resolved",
        &format!("{} artifacts for {} ({scope})", resolved.len(), root.coordinate()),
    );
    Ok(())
}

fn json_output(serialized: serde_json::Result<String>) -> Result<String> {
    serialized.map_err(|e| {
        DepotError::Serialization {
            message: format!("Failed to serialize resolved set: {e}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn json_failures_are_serialization_errors() {
        let unkeyable: BTreeMap<Vec<u8>, u8> = BTreeMap::from([(vec![1], 1)]);
        let err = json_output(serde_json::to_string_pretty(&unkeyable)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DepotError>(),
            Some(DepotError::Serialization { .. })
        ));

        assert_eq!(json_output(serde_json::to_string(&["g:a:1"])).unwrap(), r#"["g:a:1"]"#);
    }
}
