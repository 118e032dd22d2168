//! Core data types for depot.
//!
//! Versions and version ranges, artifact coordinates, dependency edges and
//! scopes, project descriptors, and the `depot.toml` configuration.

pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod descriptor;
pub mod version;
