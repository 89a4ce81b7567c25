//! Canonical package metadata.
//!
//! [`PackageMetadata`] is the normalized in-memory form of one package:
//! defaults filled, interface shorthands expanded, all paths resolved to
//! absolute locations under the package directory. The transform from a
//! validated config is pure and does no I/O.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::{PackageConfig, ProvidesConfig, PublishConfig, ReferenceConfig};
use crate::util::hash::Fingerprint;

/// Default services module path, relative to the package directory.
const DEFAULT_SERVICES_MODULE: &str = "services";

/// A reference to a named interface, singular or "all".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceReference {
    /// Opaque interface identifier, conventionally `<namespace>.<Name>`.
    pub interface_name: String,

    /// Optional secondary key narrowing which provider satisfies this
    /// reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,

    /// When true, the reference accepts every matching provider (0..N);
    /// when false, exactly one provider must exist.
    pub all: bool,
}

impl InterfaceReference {
    /// A singular, unqualified reference to an interface.
    pub fn new(interface_name: impl Into<String>) -> Self {
        InterfaceReference {
            interface_name: interface_name.into(),
            qualifier: None,
            all: false,
        }
    }

    /// Stable lookup key for this reference: the interface name, plus the
    /// qualifier when present.
    pub fn key(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}:{}", self.interface_name, q),
            None => self.interface_name.clone(),
        }
    }
}

impl fmt::Display for InterfaceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interface_name)?;
        if let Some(q) = &self.qualifier {
            write!(f, " (qualifier: {q})")?;
        }
        if self.all {
            write!(f, " (all)")?;
        }
        Ok(())
    }
}

/// An interface provided by a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedInterface {
    pub interface_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl fmt::Display for ProvidedInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interface_name)?;
        if let Some(q) = &self.qualifier {
            write!(f, " (qualifier: {q})")?;
        }
        Ok(())
    }
}

/// A named reference declared by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedReference {
    /// The injection name the service sees the dependency under.
    pub name: String,

    /// The referenced interface.
    pub reference: InterfaceReference,
}

/// One declared service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service name, unique within its package.
    pub name: String,

    /// Provided interfaces, in declaration order.
    pub provides: Vec<ProvidedInterface>,

    /// Consumed interfaces, in declaration order.
    pub references: Vec<NamedReference>,
}

/// One entry point with its resolved module location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// The entry point name as declared, e.g. `index` or `widgets/button`.
    pub name: String,

    /// Absolute extension-less module path under the package directory.
    pub path: PathBuf,
}

/// Canonical, normalized metadata for one package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    /// Package name (derived from the package directory by the caller).
    pub name: String,

    /// Absolute package directory.
    pub directory: PathBuf,

    /// Entry points, in declaration order.
    pub entry_points: Vec<EntryPoint>,

    /// Services, in declaration order.
    pub services: Vec<Service>,

    /// UI references, in declaration order.
    pub ui_references: Vec<InterfaceReference>,

    /// Absolute path to the package's style file, if declared.
    pub styles: Option<PathBuf>,

    /// Declared locale tags, in order.
    pub locales: Vec<String>,

    /// Absolute path to the services module.
    pub services_module: PathBuf,

    /// Publish options.
    pub publish: PublishConfig,
}

impl PackageMetadata {
    /// Build the canonical model from a validated config.
    ///
    /// Pure and deterministic: fills defaults, expands string shorthands to
    /// full references, and resolves declared paths against `directory`.
    pub fn from_config(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        config: &PackageConfig,
    ) -> Self {
        let directory = directory.into();

        let entry_points = config
            .entry_points
            .iter()
            .map(|name| EntryPoint {
                name: name.clone(),
                path: directory.join(name),
            })
            .collect();

        let services = config
            .services
            .iter()
            .map(|(service_name, service)| Service {
                name: service_name.clone(),
                provides: service.provides.iter().map(expand_provides).collect(),
                references: service
                    .references
                    .iter()
                    .map(|(ref_name, reference)| NamedReference {
                        name: ref_name.clone(),
                        reference: expand_reference(reference),
                    })
                    .collect(),
            })
            .collect();

        let ui_references = config.ui.references.iter().map(expand_reference).collect();

        let services_module = directory.join(
            config
                .services_module
                .as_deref()
                .unwrap_or(DEFAULT_SERVICES_MODULE),
        );

        PackageMetadata {
            name: name.into(),
            directory: directory.clone(),
            entry_points,
            services,
            ui_references,
            styles: config.styles.as_deref().map(|s| directory.join(s)),
            locales: config.i18n.clone(),
            services_module,
            publish: config.publish_config,
        }
    }

    /// Look up a service by name.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// The style path relative to the package directory, as declared.
    pub fn styles_relative(&self) -> Option<&Path> {
        self.styles
            .as_deref()
            .and_then(|s| s.strip_prefix(&self.directory).ok())
    }

    /// Path of the locale source file for one locale tag.
    pub fn locale_path(&self, locale: &str) -> PathBuf {
        self.directory.join("i18n").join(format!("{locale}.yaml"))
    }

    /// Feed this package's structural identity into a fingerprint.
    pub fn fingerprint_into(&self, fp: &mut Fingerprint) {
        fp.update_str(&self.name);
        fp.update_str(&self.directory.to_string_lossy());

        fp.update_len(self.entry_points.len());
        for entry in &self.entry_points {
            fp.update_str(&entry.name);
        }

        fp.update_len(self.services.len());
        for service in &self.services {
            fp.update_str(&service.name);
            fp.update_len(service.provides.len());
            for provided in &service.provides {
                fp.update_str(&provided.interface_name);
                fp.update_opt(provided.qualifier.as_deref());
            }
            fp.update_len(service.references.len());
            for named in &service.references {
                fp.update_str(&named.name);
                reference_fingerprint(&named.reference, fp);
            }
        }

        fp.update_len(self.ui_references.len());
        for reference in &self.ui_references {
            reference_fingerprint(reference, fp);
        }

        match &self.styles {
            Some(path) => fp.update_opt(Some(path.to_string_lossy().as_ref())),
            None => fp.update_opt(None),
        };
        fp.update_len(self.locales.len());
        fp.update_strs(self.locales.iter().map(String::as_str));
        fp.update_bool(self.publish.strict);
        fp.update_bool(self.publish.types);
    }
}

fn reference_fingerprint(reference: &InterfaceReference, fp: &mut Fingerprint) {
    fp.update_str(&reference.interface_name);
    fp.update_opt(reference.qualifier.as_deref());
    fp.update_bool(reference.all);
}

fn expand_provides(provides: &ProvidesConfig) -> ProvidedInterface {
    ProvidedInterface {
        interface_name: provides.interface_name().to_string(),
        qualifier: provides.qualifier().map(str::to_string),
    }
}

fn expand_reference(reference: &ReferenceConfig) -> InterfaceReference {
    match reference {
        ReferenceConfig::Name(name) => InterfaceReference::new(name.clone()),
        ReferenceConfig::Detailed {
            name,
            qualifier,
            all,
        } => InterfaceReference {
            interface_name: name.clone(),
            qualifier: qualifier.clone(),
            all: *all,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{parse_config, Generation};
    use std::path::Path;

    fn metadata_from(content: &str) -> PackageMetadata {
        let config =
            parse_config(content, Path::new("/ws/pkg/Rigging.toml"), Generation(0)).unwrap();
        PackageMetadata::from_config("pkg", "/ws/pkg", &config)
    }

    #[test]
    fn test_defaults_expand_to_index_entry_point() {
        let meta = metadata_from("");
        assert_eq!(meta.entry_points.len(), 1);
        assert_eq!(meta.entry_points[0].name, "index");
        assert_eq!(meta.entry_points[0].path, PathBuf::from("/ws/pkg/index"));
        assert_eq!(meta.services_module, PathBuf::from("/ws/pkg/services"));
    }

    #[test]
    fn test_shorthand_expansion() {
        let meta = metadata_from(
            r#"
[services.Svc]
provides = ["ns.Thing"]

[services.Svc.references]
dep = "ns.Dep"

[ui]
references = ["ns.Thing"]
"#,
        );

        let service = meta.service("Svc").unwrap();
        assert_eq!(
            service.provides[0],
            ProvidedInterface {
                interface_name: "ns.Thing".to_string(),
                qualifier: None,
            }
        );
        assert_eq!(
            service.references[0].reference,
            InterfaceReference::new("ns.Dep")
        );
        assert_eq!(meta.ui_references[0], InterfaceReference::new("ns.Thing"));
        assert!(!meta.ui_references[0].all);
    }

    #[test]
    fn test_paths_resolved_against_directory() {
        let meta = metadata_from(
            r#"
entry_points = ["widgets/button"]
styles = "styles/main.css"
services_module = "impl/services"
i18n = ["de"]
"#,
        );

        assert_eq!(
            meta.entry_points[0].path,
            PathBuf::from("/ws/pkg/widgets/button")
        );
        assert_eq!(meta.styles, Some(PathBuf::from("/ws/pkg/styles/main.css")));
        assert_eq!(
            meta.styles_relative(),
            Some(Path::new("styles/main.css"))
        );
        assert_eq!(meta.services_module, PathBuf::from("/ws/pkg/impl/services"));
        assert_eq!(meta.locale_path("de"), PathBuf::from("/ws/pkg/i18n/de.yaml"));
    }

    #[test]
    fn test_from_config_is_deterministic() {
        let content = r#"
[services.Svc]
provides = [{ name = "ns.Thing", qualifier = "q" }]

[services.Svc.references]
others = { name = "ns.Other", all = true }
"#;
        let first = metadata_from(content);
        let second = metadata_from(content);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_key_includes_qualifier() {
        let unqualified = InterfaceReference::new("ns.Thing");
        let qualified = InterfaceReference {
            interface_name: "ns.Thing".to_string(),
            qualifier: Some("base".to_string()),
            all: false,
        };

        assert_eq!(unqualified.key(), "ns.Thing");
        assert_eq!(qualified.key(), "ns.Thing:base");
        assert_ne!(unqualified.key(), qualified.key());
    }
}
