//! Application metadata module.
//!
//! Serializes the whole resolved package/service graph - names,
//! provided/consumed interfaces, locale lists, style references - as a JSON
//! literal the runtime container reads to drive service instantiation
//! ordering. The JSON is built from ordered sequences only, so the output
//! is byte-identical for identical input.

use serde::Serialize;

use crate::codegen::{header, GenerateError};
use crate::core::package::{InterfaceReference, PackageMetadata, ProvidedInterface};
use crate::core::workspace::Workspace;
use crate::resolver::{ProviderId, Resolution};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppMetadataDoc<'a> {
    packages: Vec<PackageDoc<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageDoc<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    styles: Option<String>,
    locales: &'a [String],
    services: Vec<ServiceDoc<'a>>,
    ui: UiDoc<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDoc<'a> {
    name: &'a str,
    provides: &'a [ProvidedInterface],
    references: Vec<NamedReferenceDoc<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NamedReferenceDoc<'a> {
    name: &'a str,
    #[serde(flatten)]
    reference: ReferenceDoc<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UiDoc<'a> {
    references: Vec<ReferenceDoc<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceDoc<'a> {
    #[serde(flatten)]
    reference: &'a InterfaceReference,
    providers: Vec<&'a ProviderId>,
}

/// Generate the application metadata module for the whole workspace.
pub fn generate_app_metadata(
    workspace: &Workspace,
    resolution: &Resolution,
) -> Result<String, GenerateError> {
    let packages = workspace
        .packages()
        .iter()
        .map(|package| package_doc(package, resolution))
        .collect::<Result<Vec<_>, _>>()?;

    let doc = AppMetadataDoc { packages };
    let json = serde_json::to_string_pretty(&doc)?;

    let mut out = header("app");
    out.push_str("export const appMetadata = ");
    out.push_str(&json);
    out.push_str(";\n");
    Ok(out)
}

fn package_doc<'a>(
    package: &'a PackageMetadata,
    resolution: &'a Resolution,
) -> Result<PackageDoc<'a>, GenerateError> {
    let services = package
        .services
        .iter()
        .map(|service| {
            let references = service
                .references
                .iter()
                .map(|named| {
                    let binding = resolution
                        .service_binding(&package.name, &service.name, &named.name)
                        .ok_or_else(|| GenerateError::UnresolvedReference {
                            package: package.name.clone(),
                            reference: named.name.clone(),
                        })?;
                    Ok(NamedReferenceDoc {
                        name: &named.name,
                        reference: ReferenceDoc {
                            reference: &named.reference,
                            providers: binding.providers.iter().collect(),
                        },
                    })
                })
                .collect::<Result<Vec<_>, GenerateError>>()?;

            Ok(ServiceDoc {
                name: &service.name,
                provides: &service.provides,
                references,
            })
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;

    let ui_references = package
        .ui_references
        .iter()
        .map(|reference| {
            let binding = resolution
                .ui_binding(&package.name, reference)
                .ok_or_else(|| GenerateError::UnresolvedReference {
                    package: package.name.clone(),
                    reference: reference.key(),
                })?;
            Ok(ReferenceDoc {
                reference,
                providers: binding.providers.iter().collect(),
            })
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;

    Ok(PackageDoc {
        name: &package.name,
        styles: package
            .styles_relative()
            .map(|p| p.to_string_lossy().into_owned()),
        locales: &package.locales,
        services,
        ui: UiDoc {
            references: ui_references,
        },
    })
}
