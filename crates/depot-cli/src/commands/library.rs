//! Handler for `depot library`.

use std::sync::Arc;

use miette::Result;

use depot_core::config::DepotConfig;
use depot_core::coordinate::Coordinate;
use depot_core::dependency::Scope;
use depot_maven::source::ArtifactSource;
use depot_resolver::provider::MavenProvider;

pub async fn exec(config: &DepotConfig, coordinate: &str, scope: &str) -> Result<()> {
    let coordinate = Coordinate::parse(coordinate)?;
    let scope: Scope = scope.parse()?;

    let provider = MavenProvider::new(Arc::new(ArtifactSource::from_config(config)?))
        .with_concurrency(config.fetch.concurrency);
    let path = provider
        .library(&coordinate.name(), &coordinate.version, scope)
        .await?;
    println!("{}", path.display());
    Ok(())
}
