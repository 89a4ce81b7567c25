//! Core data model: package configuration, canonical metadata, and the
//! workspace closure.

pub mod config;
pub mod package;
pub mod workspace;

pub use config::{load_config, parse_config, ConfigError, Generation, PackageConfig};
pub use package::{
    EntryPoint, InterfaceReference, NamedReference, PackageMetadata, ProvidedInterface, Service,
};
pub use workspace::Workspace;
