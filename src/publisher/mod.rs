//! Package publishing.
//!
//! Assembles the publishable `dist/` artifact set for one package from its
//! normalized metadata and source tree. Publishing needs no cross-package
//! resolution. The output is a pure function of (source tree, metadata):
//! re-running with unchanged input reproduces byte-identical content, so
//! no timestamps or other non-deterministic data are embedded.

pub mod plan;

pub use plan::{plan_package, ArtifactKind, ArtifactPlan, PlannedArtifact, PublishWarning};

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::core::package::PackageMetadata;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs;

/// Name of the artifact listing written alongside the artifacts.
pub const DIST_MANIFEST_NAME: &str = "rig-manifest.json";

/// Fatal packaging failure: strict mode escalated warnings.
#[derive(Debug, Error)]
#[error("packaging `{package}` failed in strict mode with {} warning(s)", .warnings.len())]
pub struct PackagingError {
    pub package: String,
    pub warnings: Vec<PublishWarning>,
}

impl PackagingError {
    /// Convert to a user-friendly diagnostic listing every warning.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!(
            "packaging `{}` failed in strict mode",
            self.package
        ));
        for warning in &self.warnings {
            diag = diag.with_context(warning.to_string());
        }
        diag.with_suggestion(suggestions::STRICT_PUBLISH.to_string())
    }
}

/// Publish options.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Output directory; defaults to `dist/` under the package directory.
    pub out_dir: Option<PathBuf>,
}

/// The result of a successful publish.
#[derive(Debug)]
pub struct PublishReport {
    pub out_dir: PathBuf,
    pub artifacts: Vec<PlannedArtifact>,
    pub warnings: Vec<PublishWarning>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DistManifest<'a> {
    name: &'a str,
    entry_points: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    styles: Option<&'a str>,
    locales: &'a [String],
    types: bool,
    artifacts: Vec<ManifestArtifact>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestArtifact {
    kind: &'static str,
    path: String,
}

/// Publish one package.
///
/// In strict mode any planning warning escalates to a fatal
/// [`PackagingError`] before anything is written; otherwise warnings are
/// logged and the affected artifacts are omitted best-effort.
pub fn publish(package: &PackageMetadata, options: &PublishOptions) -> Result<PublishReport> {
    let plan = plan_package(package);

    if package.publish.strict && !plan.warnings.is_empty() {
        return Err(PackagingError {
            package: package.name.clone(),
            warnings: plan.warnings,
        }
        .into());
    }

    for warning in &plan.warnings {
        tracing::warn!("{}: {warning}", package.name);
    }

    let out_dir = options
        .out_dir
        .clone()
        .unwrap_or_else(|| package.directory.join("dist"));

    // Clear previous output so the result is exactly the planned set.
    fs::remove_dir_all_if_exists(&out_dir)?;
    fs::ensure_dir(&out_dir)?;

    let mut artifacts = plan.artifacts;
    artifacts.sort_by(|a, b| a.dest.cmp(&b.dest));

    for artifact in &artifacts {
        fs::copy_file(&artifact.source, &out_dir.join(&artifact.dest)).with_context(|| {
            format!(
                "failed to publish {} artifact for `{}`",
                artifact.kind.as_str(),
                package.name
            )
        })?;
        tracing::debug!(
            "published {} -> {}",
            artifact.source.display(),
            artifact.dest.display()
        );
    }

    let manifest = render_manifest(package, &artifacts)?;
    fs::write_string(&out_dir.join(DIST_MANIFEST_NAME), &manifest)?;

    tracing::info!(
        "published `{}`: {} artifact(s) to {}",
        package.name,
        artifacts.len(),
        out_dir.display()
    );

    Ok(PublishReport {
        out_dir,
        artifacts,
        warnings: plan.warnings,
    })
}

fn render_manifest(package: &PackageMetadata, artifacts: &[PlannedArtifact]) -> Result<String> {
    let styles = artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::Styles)
        .map(|_| "styles.css");

    let manifest = DistManifest {
        name: &package.name,
        entry_points: package
            .entry_points
            .iter()
            .map(|e| e.name.as_str())
            .collect(),
        styles,
        locales: &package.locales,
        types: package.publish.types,
        artifacts: artifacts
            .iter()
            .map(|a| ManifestArtifact {
                kind: a.kind.as_str(),
                path: a.dest.to_string_lossy().into_owned(),
            })
            .collect(),
    };

    let mut out = serde_json::to_string_pretty(&manifest)
        .context("failed to serialize dist manifest")?;
    out.push('\n');
    Ok(out)
}
