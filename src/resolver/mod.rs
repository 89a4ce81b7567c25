//! Service dependency resolution.
//!
//! Given the full workspace closure, resolves every declared interface
//! reference to concrete providing services. The resolver builds a lookup
//! table over (interface, qualifier) pairs; it never instantiates services,
//! so cross-package reference cycles are permitted and left to the runtime
//! container. Resolution is pure and deterministic: identical package
//! metadata always yields an identical result, which enables memoization
//! keyed by the workspace's structural fingerprint.

pub mod errors;
pub mod resolve;

pub use errors::ResolveError;
pub use resolve::{ProviderId, ReferenceOrigin, ReferenceSite, ResolvedBinding, Resolution};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::package::{InterfaceReference, PackageMetadata};
use crate::core::workspace::Workspace;

/// Index key: an interface name with its optional qualifier. Only exact
/// pairs match; a qualifier never acts as a fallback or tie-breaker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct InterfaceKey {
    interface_name: String,
    qualifier: Option<String>,
}

impl InterfaceKey {
    fn for_reference(reference: &InterfaceReference) -> Self {
        InterfaceKey {
            interface_name: reference.interface_name.clone(),
            qualifier: reference.qualifier.clone(),
        }
    }
}

/// Provider lookup table for one workspace closure.
///
/// Candidate lists are ordered by package enumeration order, then service
/// declaration order within the package; the order is stable across runs.
#[derive(Debug, Default)]
struct ProviderIndex {
    providers: BTreeMap<InterfaceKey, Vec<ProviderId>>,
}

impl ProviderIndex {
    /// Build the index, detecting same-package duplicate providers.
    fn build(workspace: &Workspace) -> Result<Self, ResolveError> {
        let mut index = ProviderIndex::default();

        for package in workspace.packages() {
            index.add_package(package)?;
        }

        Ok(index)
    }

    fn add_package(&mut self, package: &PackageMetadata) -> Result<(), ResolveError> {
        let mut declared: BTreeMap<InterfaceKey, String> = BTreeMap::new();

        for service in &package.services {
            for provided in &service.provides {
                let key = InterfaceKey {
                    interface_name: provided.interface_name.clone(),
                    qualifier: provided.qualifier.clone(),
                };

                if let Some(first) = declared.get(&key) {
                    return Err(ResolveError::DuplicateProvider {
                        package: package.name.clone(),
                        interface_name: key.interface_name,
                        qualifier: key.qualifier,
                        services: vec![first.clone(), service.name.clone()],
                    });
                }
                declared.insert(key.clone(), service.name.clone());

                self.providers.entry(key).or_default().push(ProviderId {
                    package: package.name.clone(),
                    service: service.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn candidates(&self, key: &InterfaceKey) -> &[ProviderId] {
        self.providers.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Resolve every declared reference in the workspace.
///
/// Fails on the first violation; a failed pass publishes no partial
/// resolution.
pub fn resolve_workspace(workspace: &Workspace) -> Result<Resolution, ResolveError> {
    resolve_with_fingerprint(workspace, workspace.fingerprint())
}

fn resolve_with_fingerprint(
    workspace: &Workspace,
    fingerprint: String,
) -> Result<Resolution, ResolveError> {
    let index = ProviderIndex::build(workspace)?;
    let mut bindings = BTreeMap::new();

    for package in workspace.packages() {
        for service in &package.services {
            for named in &service.references {
                let site = ReferenceSite {
                    package: package.name.clone(),
                    origin: ReferenceOrigin::Service(service.name.clone()),
                    reference_name: named.name.clone(),
                };
                let binding = resolve_reference(&index, &named.reference, &site)?;
                bindings.insert(site, binding);
            }
        }

        for reference in &package.ui_references {
            let site = ReferenceSite {
                package: package.name.clone(),
                origin: ReferenceOrigin::Ui,
                reference_name: reference.key(),
            };
            let binding = resolve_reference(&index, reference, &site)?;
            bindings.insert(site, binding);
        }
    }

    Ok(Resolution::new(bindings, fingerprint))
}

fn resolve_reference(
    index: &ProviderIndex,
    reference: &InterfaceReference,
    site: &ReferenceSite,
) -> Result<ResolvedBinding, ResolveError> {
    let key = InterfaceKey::for_reference(reference);
    let candidates = index.candidates(&key);

    let providers = if reference.all {
        // Any candidate count is valid, including zero.
        candidates.to_vec()
    } else {
        match candidates {
            [] => {
                return Err(ResolveError::MissingProvider {
                    interface_name: key.interface_name,
                    qualifier: key.qualifier,
                    site: site.clone(),
                })
            }
            [single] => vec![single.clone()],
            many => {
                return Err(ResolveError::AmbiguousProvider {
                    interface_name: key.interface_name,
                    qualifier: key.qualifier,
                    site: site.clone(),
                    candidates: many.to_vec(),
                })
            }
        }
    };

    Ok(ResolvedBinding {
        reference: reference.clone(),
        providers,
    })
}

/// Memoizing wrapper around [`resolve_workspace`].
///
/// Keyed by the workspace's structural fingerprint. The cached resolution
/// is handed out as a shared `Arc` and replaced wholesale on change, so
/// readers never observe a partially rebuilt graph. A failed re-resolution
/// leaves the previous entry untouched.
#[derive(Debug, Default)]
pub struct ResolverCache {
    cached: Option<Arc<Resolution>>,
}

impl ResolverCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        ResolverCache::default()
    }

    /// Resolve the workspace, reusing the cached resolution when the
    /// fingerprint is unchanged.
    pub fn resolve(&mut self, workspace: &Workspace) -> Result<Arc<Resolution>, ResolveError> {
        let fingerprint = workspace.fingerprint();

        if let Some(cached) = &self.cached {
            if cached.fingerprint() == fingerprint {
                return Ok(Arc::clone(cached));
            }
        }

        let resolution = Arc::new(resolve_with_fingerprint(workspace, fingerprint)?);
        self.cached = Some(Arc::clone(&resolution));
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{parse_config, Generation};
    use std::path::Path;

    fn package(name: &str, content: &str) -> PackageMetadata {
        let config = parse_config(content, Path::new("/ws/Rigging.toml"), Generation(0)).unwrap();
        PackageMetadata::from_config(name, format!("/ws/{name}"), &config)
    }

    fn workspace(packages: Vec<PackageMetadata>) -> Workspace {
        let mut ws = Workspace::new();
        for pkg in packages {
            ws.add_package(pkg).unwrap();
        }
        ws
    }

    #[test]
    fn test_cross_package_provider_found() {
        // Package p provides ns.Thing; package q's UI references it.
        let ws = workspace(vec![
            package(
                "p",
                r#"
[services.svc]
provides = ["ns.Thing"]
"#,
            ),
            package(
                "q",
                r#"
[ui]
references = ["ns.Thing"]
"#,
            ),
        ]);

        let resolution = resolve_workspace(&ws).unwrap();
        let binding = resolution
            .ui_binding("q", &InterfaceReference::new("ns.Thing"))
            .unwrap();
        assert_eq!(
            binding.providers,
            vec![ProviderId {
                package: "p".to_string(),
                service: "svc".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_provider_names_interface_and_site() {
        let ws = workspace(vec![package(
            "q",
            r#"
[services.Consumer]

[services.Consumer.references]
dep = "ns.Missing"
"#,
        )]);

        let err = resolve_workspace(&ws).unwrap_err();
        match err {
            ResolveError::MissingProvider {
                interface_name,
                site,
                ..
            } => {
                assert_eq!(interface_name, "ns.Missing");
                assert_eq!(site.package, "q");
                assert_eq!(
                    site.origin,
                    ReferenceOrigin::Service("Consumer".to_string())
                );
                assert_eq!(site.reference_name, "dep");
            }
            other => panic!("expected MissingProvider, got {other:?}"),
        }
    }

    #[test]
    fn test_two_providers_are_ambiguous_for_singular_reference() {
        let ws = workspace(vec![
            package("p1", "[services.SvcA]\nprovides = [\"ns.Thing\"]\n"),
            package("p2", "[services.SvcB]\nprovides = [\"ns.Thing\"]\n"),
            package("q", "[ui]\nreferences = [\"ns.Thing\"]\n"),
        ]);

        let err = resolve_workspace(&ws).unwrap_err();
        match err {
            ResolveError::AmbiguousProvider { candidates, .. } => {
                let names: Vec<_> = candidates.iter().map(|c| c.package.as_str()).collect();
                assert_eq!(names, vec!["p1", "p2"]);
            }
            other => panic!("expected AmbiguousProvider, got {other:?}"),
        }
    }

    #[test]
    fn test_all_reference_accepts_zero_providers() {
        let ws = workspace(vec![package(
            "q",
            r#"
[services.Consumer]

[services.Consumer.references]
extensions = { name = "ns.Extension", all = true }
"#,
        )]);

        let resolution = resolve_workspace(&ws).unwrap();
        let binding = resolution.service_binding("q", "Consumer", "extensions").unwrap();
        assert!(binding.providers.is_empty());
    }

    #[test]
    fn test_all_reference_returns_candidates_in_workspace_order() {
        let ws = workspace(vec![
            package("zeta", "[services.Z]\nprovides = [\"ns.Ext\"]\n"),
            package(
                "alpha",
                r#"
[services.A1]
provides = ["ns.Ext"]

[services.A2]
provides = ["ns.Ext"]
"#,
            ),
            package(
                "q",
                r#"
[ui]
references = [{ name = "ns.Ext", all = true }]
"#,
            ),
        ]);

        let resolution = resolve_workspace(&ws).unwrap();
        let reference = InterfaceReference {
            interface_name: "ns.Ext".to_string(),
            qualifier: None,
            all: true,
        };
        let binding = resolution.ui_binding("q", &reference).unwrap();

        // Package enumeration order (zeta first), then declaration order.
        let providers: Vec<_> = binding.providers.iter().map(ProviderId::to_string).collect();
        assert_eq!(providers, vec!["zeta/Z", "alpha/A1", "alpha/A2"]);
    }

    #[test]
    fn test_qualifier_distinguishes_providers() {
        let ws = workspace(vec![
            package(
                "p",
                r#"
[services.Base]
provides = [{ name = "map.Layer", qualifier = "base" }]

[services.Overlay]
provides = [{ name = "map.Layer", qualifier = "overlay" }]
"#,
            ),
            package(
                "q",
                r#"
[ui]
references = [{ name = "map.Layer", qualifier = "base" }]
"#,
            ),
        ]);

        let resolution = resolve_workspace(&ws).unwrap();
        let reference = InterfaceReference {
            interface_name: "map.Layer".to_string(),
            qualifier: Some("base".to_string()),
            all: false,
        };
        let binding = resolution.ui_binding("q", &reference).unwrap();
        assert_eq!(binding.providers[0].service, "Base");
    }

    #[test]
    fn test_same_package_duplicate_provider_fails_even_unreferenced() {
        let ws = workspace(vec![package(
            "p",
            r#"
[services.SvcA]
provides = ["ns.Thing"]

[services.SvcB]
provides = ["ns.Thing"]
"#,
        )]);

        let err = resolve_workspace(&ws).unwrap_err();
        match err {
            ResolveError::DuplicateProvider {
                package, services, ..
            } => {
                assert_eq!(package, "p");
                assert_eq!(services, vec!["SvcA", "SvcB"]);
            }
            other => panic!("expected DuplicateProvider, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_across_packages_is_not_a_duplicate_error() {
        // Two packages providing the same interface is only an error for a
        // singular consumer, not at index-build time.
        let ws = workspace(vec![
            package("p1", "[services.SvcA]\nprovides = [\"ns.Thing\"]\n"),
            package("p2", "[services.SvcB]\nprovides = [\"ns.Thing\"]\n"),
        ]);

        let resolution = resolve_workspace(&ws).unwrap();
        assert!(resolution.is_empty());
    }

    #[test]
    fn test_cyclic_service_references_are_permitted() {
        let ws = workspace(vec![
            package(
                "p",
                r#"
[services.A]
provides = ["ns.A"]

[services.A.references]
b = "ns.B"
"#,
            ),
            package(
                "q",
                r#"
[services.B]
provides = ["ns.B"]

[services.B.references]
a = "ns.A"
"#,
            ),
        ]);

        let resolution = resolve_workspace(&ws).unwrap();
        assert_eq!(resolution.len(), 2);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let build = || {
            workspace(vec![
                package("p", "[services.svc]\nprovides = [\"ns.Thing\"]\n"),
                package("q", "[ui]\nreferences = [\"ns.Thing\"]\n"),
            ])
        };

        let first = resolve_workspace(&build()).unwrap();
        let second = resolve_workspace(&build()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_reuses_resolution_for_unchanged_workspace() {
        let ws = workspace(vec![
            package("p", "[services.svc]\nprovides = [\"ns.Thing\"]\n"),
            package("q", "[ui]\nreferences = [\"ns.Thing\"]\n"),
        ]);

        let mut cache = ResolverCache::new();
        let first = cache.resolve(&ws).unwrap();
        let second = cache.resolve(&ws).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A changed package set produces a fresh resolution.
        let mut changed = ws.clone();
        changed
            .add_package(package("r", "[services.extra]\nprovides = [\"ns.Extra\"]\n"))
            .unwrap();
        let third = cache.resolve(&changed).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
