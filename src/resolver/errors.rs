//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::resolver::resolve::{ProviderId, ReferenceSite};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during service dependency resolution.
///
/// Any variant aborts the resolution pass entirely; no partial binding
/// graph is ever handed to code generation.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A singular reference has no matching provider in the workspace.
    #[error("no provider for interface `{interface_name}`{} required by {site}", qualifier_suffix(.qualifier))]
    MissingProvider {
        interface_name: String,
        qualifier: Option<String>,
        site: ReferenceSite,
    },

    /// A singular reference matches two or more providers.
    #[error("ambiguous providers for interface `{interface_name}`{} required by {site}", qualifier_suffix(.qualifier))]
    AmbiguousProvider {
        interface_name: String,
        qualifier: Option<String>,
        site: ReferenceSite,
        candidates: Vec<ProviderId>,
    },

    /// Two services in one package provide the same (interface, qualifier)
    /// pair. Reported regardless of whether the interface is referenced.
    #[error("duplicate providers for interface `{interface_name}`{} in package `{package}`", qualifier_suffix(.qualifier))]
    DuplicateProvider {
        package: String,
        interface_name: String,
        qualifier: Option<String>,
        services: Vec<String>,
    },
}

fn qualifier_suffix(qualifier: &Option<String>) -> String {
    match qualifier {
        Some(q) => format!(" (qualifier: {q})"),
        None => String::new(),
    }
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::MissingProvider {
                interface_name,
                qualifier,
                site,
            } => Diagnostic::error(format!(
                "no provider for interface `{}`{}",
                interface_name,
                qualifier_suffix(qualifier)
            ))
            .with_context(format!("required by {site}"))
            .with_suggestion(suggestions::MISSING_PROVIDER.to_string()),

            ResolveError::AmbiguousProvider {
                interface_name,
                qualifier,
                site,
                candidates,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "ambiguous providers for interface `{}`{}",
                    interface_name,
                    qualifier_suffix(qualifier)
                ))
                .with_context(format!("required by {site}"));

                for candidate in candidates {
                    diag = diag.with_context(format!(
                        "candidate: service `{}` in package `{}`",
                        candidate.service, candidate.package
                    ));
                }

                diag.with_suggestion(suggestions::AMBIGUOUS_PROVIDER.to_string())
            }

            ResolveError::DuplicateProvider {
                package,
                interface_name,
                qualifier,
                services,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "package `{}` declares interface `{}`{} more than once",
                    package,
                    interface_name,
                    qualifier_suffix(qualifier)
                ));

                for service in services {
                    diag = diag.with_context(format!("declared by service `{service}`"));
                }

                diag.with_suggestion(
                    "Remove the duplicate `provides` entry, or distinguish the services with qualifiers"
                        .to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve::ReferenceOrigin;

    #[test]
    fn test_ambiguous_provider_diagnostic_lists_all_candidates() {
        let err = ResolveError::AmbiguousProvider {
            interface_name: "ns.Thing".to_string(),
            qualifier: None,
            site: ReferenceSite {
                package: "consumer".to_string(),
                origin: ReferenceOrigin::Ui,
                reference_name: "ns.Thing".to_string(),
            },
            candidates: vec![
                ProviderId {
                    package: "p1".to_string(),
                    service: "SvcA".to_string(),
                },
                ProviderId {
                    package: "p2".to_string(),
                    service: "SvcB".to_string(),
                },
            ],
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("ambiguous providers"));
        assert!(output.contains("p1"));
        assert!(output.contains("SvcA"));
        assert!(output.contains("p2"));
        assert!(output.contains("SvcB"));
    }

    #[test]
    fn test_missing_provider_names_interface_and_site() {
        let err = ResolveError::MissingProvider {
            interface_name: "ns.Thing".to_string(),
            qualifier: Some("base".to_string()),
            site: ReferenceSite {
                package: "consumer".to_string(),
                origin: ReferenceOrigin::Service("MySvc".to_string()),
                reference_name: "thing".to_string(),
            },
        };

        let message = err.to_string();
        assert!(message.contains("ns.Thing"));
        assert!(message.contains("base"));
        assert!(message.contains("consumer"));
        assert!(message.contains("MySvc"));
        assert!(message.contains("thing"));
    }
}
