//! Workspace closure - the full package set for one application build.
//!
//! Enumeration order is insertion order and is stable across runs; the
//! resolver's provider ordering and the generated metadata both depend on
//! it. The workspace computes a structural fingerprint over all package
//! metadata, which keys resolver memoization.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::core::config::{load_config, Generation};
use crate::core::package::PackageMetadata;
use crate::util::hash::Fingerprint;

/// Name of the per-package config file.
pub const CONFIG_FILE_NAME: &str = "Rigging.toml";

/// The ordered set of packages assembled for one application.
#[derive(Debug, Default, Clone)]
pub struct Workspace {
    packages: Vec<PackageMetadata>,
    by_name: HashMap<String, usize>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Workspace::default()
    }

    /// Discover all packages under a root directory.
    ///
    /// Scans for `Rigging.toml` files; each containing directory becomes a
    /// package named after that directory. Paths are visited in sorted
    /// order so enumeration order is reproducible.
    pub fn discover(root: &Path, generation: Generation) -> Result<Self> {
        let mut workspace = Workspace::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules" && e.file_name() != "dist");

        for entry in walker {
            let entry = entry.with_context(|| {
                format!("failed to scan workspace root: {}", root.display())
            })?;
            if !entry.file_type().is_file() || entry.file_name() != CONFIG_FILE_NAME {
                continue;
            }

            let config_path = entry.path();
            let directory = config_path.parent().unwrap_or(Path::new("."));
            let name = directory
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "root".to_string());

            let config = load_config(config_path, generation)
                .with_context(|| format!("failed to load package `{name}`"))?;
            workspace.add_package(PackageMetadata::from_config(name, directory, &config))?;
        }

        Ok(workspace)
    }

    /// Add one package to the workspace.
    ///
    /// Fails if a package with the same name is already present; package
    /// names identify providers and must be unique in the closure.
    pub fn add_package(&mut self, package: PackageMetadata) -> Result<()> {
        if self.by_name.contains_key(&package.name) {
            bail!(
                "duplicate package `{}` in workspace (at {})",
                package.name,
                package.directory.display()
            );
        }

        self.by_name
            .insert(package.name.clone(), self.packages.len());
        self.packages.push(package);
        Ok(())
    }

    /// All packages, in enumeration order.
    pub fn packages(&self) -> &[PackageMetadata] {
        &self.packages
    }

    /// Look up a package by name.
    pub fn package(&self, name: &str) -> Option<&PackageMetadata> {
        self.by_name.get(name).map(|&i| &self.packages[i])
    }

    /// Number of packages in the closure.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the workspace is empty.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Structural fingerprint over all package metadata.
    ///
    /// Identical package sets yield identical fingerprints; any change to
    /// any package's metadata changes the value.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update_len(self.packages.len());
        for package in &self.packages {
            package.fingerprint_into(&mut fp);
        }
        fp.finish()
    }
}
