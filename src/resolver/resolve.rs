//! Resolution output types.
//!
//! A [`Resolution`] is the immutable result of resolving every declared
//! reference in a workspace closure to its concrete providers. It is
//! shared read-only after construction and replaced wholesale when the
//! package set changes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::package::InterfaceReference;

/// A service that provides an interface, identified by package and service
/// name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderId {
    pub package: String,
    pub service: String,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.service)
    }
}

/// Where a reference was declared: by a named service, or by the package's
/// UI components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceOrigin {
    Service(String),
    Ui,
}

impl fmt::Display for ReferenceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceOrigin::Service(name) => write!(f, "service `{name}`"),
            ReferenceOrigin::Ui => write!(f, "UI"),
        }
    }
}

/// Identifies one declared reference in the workspace.
///
/// For service references the name is the injection name; for UI
/// references it is the referenced interface key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReferenceSite {
    pub package: String,
    pub origin: ReferenceOrigin,
    pub reference_name: String,
}

impl fmt::Display for ReferenceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of package `{}` (reference `{}`)",
            self.origin, self.package, self.reference_name
        )
    }
}

/// The providers resolved for one reference.
///
/// Exactly one provider for `all = false` references; zero or more, in
/// workspace order, for `all = true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub reference: InterfaceReference,
    pub providers: Vec<ProviderId>,
}

/// The complete, immutable resolution of one workspace closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    bindings: BTreeMap<ReferenceSite, ResolvedBinding>,
    fingerprint: String,
}

impl Resolution {
    pub(crate) fn new(
        bindings: BTreeMap<ReferenceSite, ResolvedBinding>,
        fingerprint: String,
    ) -> Self {
        Resolution {
            bindings,
            fingerprint,
        }
    }

    /// The binding for one reference site, if it was declared.
    pub fn binding(&self, site: &ReferenceSite) -> Option<&ResolvedBinding> {
        self.bindings.get(site)
    }

    /// The binding for a UI reference of one package.
    pub fn ui_binding(&self, package: &str, reference: &InterfaceReference) -> Option<&ResolvedBinding> {
        self.binding(&ReferenceSite {
            package: package.to_string(),
            origin: ReferenceOrigin::Ui,
            reference_name: reference.key(),
        })
    }

    /// The binding for a named reference of one service.
    pub fn service_binding(
        &self,
        package: &str,
        service: &str,
        reference_name: &str,
    ) -> Option<&ResolvedBinding> {
        self.binding(&ReferenceSite {
            package: package.to_string(),
            origin: ReferenceOrigin::Service(service.to_string()),
            reference_name: reference_name.to_string(),
        })
    }

    /// All bindings, ordered by site.
    pub fn iter(&self) -> impl Iterator<Item = (&ReferenceSite, &ResolvedBinding)> {
        self.bindings.iter()
    }

    /// Number of resolved reference sites.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no references were declared.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The structural fingerprint of the workspace this resolution was
    /// computed from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
