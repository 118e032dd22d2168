//! `<scope>.lib` listing files.
//!
//! One UTF-8 line per artifact, `group+artifact;version="x.y.z"`, the
//! resolving descriptor first.

use std::path::{Path, PathBuf};

use depot_core::coordinate::Coordinate;
use depot_core::dependency::Scope;
use depot_util::errors::{DepotError, DepotResult};
use depot_util::fs::{atomic_write, modified};

use crate::resolver::ResolvedSet;

/// The listing sits next to the descriptor it was generated from.
pub fn listing_path(descriptor_path: &Path, scope: Scope) -> PathBuf {
    descriptor_path.with_file_name(format!("{scope}.lib"))
}

/// A listing is fresh when it is not older than its descriptor.
pub fn is_fresh(listing: &Path, descriptor_path: &Path) -> DepotResult<bool> {
    let Some(listing_time) = modified(listing).map_err(DepotError::Io)? else {
        return Ok(false);
    };
    let descriptor_time = modified(descriptor_path)
        .map_err(DepotError::Io)?
        .ok_or_else(|| DepotError::NotFound {
            what: format!("descriptor {}", descriptor_path.display()),
        })?;
    Ok(listing_time >= descriptor_time)
}

/// The root line, then one line per resolved descriptor in resolution order.
pub fn render(root: &Coordinate, resolved: &ResolvedSet) -> String {
    let mut out = format!("{}\n", root.listing_entry());
    for descriptor in resolved {
        out.push_str(&descriptor.coordinate().listing_entry());
        out.push('\n');
    }
    out
}

/// Replace the listing at `path`.
pub fn write(path: &Path, root: &Coordinate, resolved: &ResolvedSet) -> DepotResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed stale {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(DepotError::Io(e).into()),
    }
    atomic_write(path, render(root, resolved).as_bytes()).map_err(DepotError::Io)?;
    Ok(())
}
