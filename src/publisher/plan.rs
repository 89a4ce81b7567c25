//! Artifact planning.
//!
//! Derives the logical artifact set for one package from its metadata and
//! source tree: one build artifact per entry point, an aggregated style
//! artifact, one locale bundle per declared locale, and type declarations
//! when requested. Planning only reads the source tree; nothing is
//! written.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::package::PackageMetadata;

/// Source file extensions probed for entry point and services modules.
const MODULE_EXTENSIONS: &[&str] = &["js", "mjs", "ts"];

/// The kind of a planned artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    EntryPoint,
    Styles,
    LocaleBundle,
    TypeDeclaration,
}

impl ArtifactKind {
    /// Stable identifier used in the dist manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::EntryPoint => "entry-point",
            ArtifactKind::Styles => "styles",
            ArtifactKind::LocaleBundle => "locale-bundle",
            ArtifactKind::TypeDeclaration => "type-declaration",
        }
    }
}

/// One artifact to be written into the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    pub kind: ArtifactKind,
    /// Absolute source path in the package tree.
    pub source: PathBuf,
    /// Destination path, relative to the output directory.
    pub dest: PathBuf,
}

/// A non-fatal packaging problem. In strict mode every warning escalates
/// to a fatal packaging error; otherwise it is logged and the artifact is
/// omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishWarning {
    /// A declared entry point has no source file and stays unused.
    MissingEntrySource { entry: String },
    /// `styles` points at a file that does not exist.
    MissingStyles { path: PathBuf },
    /// Services are declared but the services module file is missing.
    MissingServicesModule { path: PathBuf },
    /// A declared locale has no source file.
    MissingLocaleSource { locale: String, path: PathBuf },
    /// `publish_config.types` is set but an entry point has no declaration
    /// file.
    MissingDeclarations { entry: String },
}

impl fmt::Display for PublishWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishWarning::MissingEntrySource { entry } => {
                write!(f, "entry point `{entry}` has no source file and stays unused")
            }
            PublishWarning::MissingStyles { path } => {
                write!(f, "style file not found: {}", path.display())
            }
            PublishWarning::MissingServicesModule { path } => {
                write!(
                    f,
                    "services are declared but the services module is missing: {}",
                    path.display()
                )
            }
            PublishWarning::MissingLocaleSource { locale, path } => {
                write!(
                    f,
                    "locale `{locale}` has no source file: {}",
                    path.display()
                )
            }
            PublishWarning::MissingDeclarations { entry } => {
                write!(f, "no type declarations for entry point `{entry}`")
            }
        }
    }
}

/// The full artifact plan for one package.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPlan {
    pub artifacts: Vec<PlannedArtifact>,
    pub warnings: Vec<PublishWarning>,
}

/// Compute the artifact plan for one package.
///
/// Pure given the source tree snapshot: the same metadata and tree always
/// produce the same plan, in the same order.
pub fn plan_package(package: &PackageMetadata) -> ArtifactPlan {
    let mut plan = ArtifactPlan::default();

    for entry in &package.entry_points {
        match probe_module(&entry.path) {
            Some(source) => plan.artifacts.push(PlannedArtifact {
                kind: ArtifactKind::EntryPoint,
                source,
                dest: PathBuf::from(format!("{}.js", entry.name)),
            }),
            None => plan.warnings.push(PublishWarning::MissingEntrySource {
                entry: entry.name.clone(),
            }),
        }
    }

    if let Some(styles) = &package.styles {
        if styles.is_file() {
            plan.artifacts.push(PlannedArtifact {
                kind: ArtifactKind::Styles,
                source: styles.clone(),
                dest: PathBuf::from("styles.css"),
            });
        } else {
            plan.warnings.push(PublishWarning::MissingStyles {
                path: styles.clone(),
            });
        }
    }

    if !package.services.is_empty() && probe_module(&package.services_module).is_none() {
        plan.warnings.push(PublishWarning::MissingServicesModule {
            path: package.services_module.clone(),
        });
    }

    for locale in &package.locales {
        let source = package.locale_path(locale);
        if source.is_file() {
            plan.artifacts.push(PlannedArtifact {
                kind: ArtifactKind::LocaleBundle,
                source,
                dest: PathBuf::from(format!("i18n/{locale}.yaml")),
            });
        } else {
            plan.warnings.push(PublishWarning::MissingLocaleSource {
                locale: locale.clone(),
                path: source,
            });
        }
    }

    if package.publish.types {
        for entry in &package.entry_points {
            let source = sibling_with_suffix(&entry.path, ".d.ts");
            if source.is_file() {
                plan.artifacts.push(PlannedArtifact {
                    kind: ArtifactKind::TypeDeclaration,
                    source,
                    dest: PathBuf::from(format!("{}.d.ts", entry.name)),
                });
            } else {
                plan.warnings.push(PublishWarning::MissingDeclarations {
                    entry: entry.name.clone(),
                });
            }
        }
    }

    plan
}

/// Probe an extension-less module path for a source file.
fn probe_module(path: &Path) -> Option<PathBuf> {
    MODULE_EXTENSIONS.iter().find_map(|ext| {
        let candidate = sibling_with_suffix(path, &format!(".{ext}"));
        candidate.is_file().then_some(candidate)
    })
}

/// Append a suffix to the final path component.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
