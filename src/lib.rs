//! Rigging - build-time service wiring and package metadata toolkit.
//!
//! This crate is the planning/metadata layer of a service-oriented web app
//! build: it loads and validates per-package `Rigging.toml` configurations,
//! resolves inter-package service references to concrete providers, emits
//! the glue modules that wire UI code to resolved bindings, and assembles
//! publishable artifacts for individual packages. The runtime service
//! container, the UI framework, and the module bundler are external
//! collaborators consuming this crate's output.

pub mod codegen;
pub mod core;
pub mod publisher;
pub mod resolver;
pub mod util;

pub use self::core::{
    load_config, ConfigError, Generation, InterfaceReference, PackageConfig, PackageMetadata,
    Workspace,
};

pub use codegen::{generate, GenerateContext, ModuleCache, ModuleKind};
pub use publisher::{publish, PackagingError, PublishOptions, PublishReport};
pub use resolver::{resolve_workspace, Resolution, ResolveError, ResolverCache};
