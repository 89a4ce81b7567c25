//! Service-hook glue module.
//!
//! For each UI reference of a package, the hooks module exposes a typed
//! accessor that asks the runtime service locator for the resolved
//! provider(s). The package's own binding table is embedded in the text;
//! a lookup outside the declared scope throws `ServiceNotFoundError` at
//! runtime.

use crate::codegen::{header, js_string, GenerateError, RUNTIME_MODULE};
use crate::core::package::PackageMetadata;
use crate::resolver::{ResolvedBinding, Resolution};

/// Generate the hooks module for one package.
pub fn generate_hooks(
    package: &PackageMetadata,
    resolution: &Resolution,
) -> Result<String, GenerateError> {
    let mut out = header(&package.name);

    out.push_str(&format!(
        "import {{\n    lookupIntl,\n    lookupProperties,\n    lookupService,\n    lookupServices,\n    ServiceNotFoundError,\n}} from {};\n\n",
        js_string(RUNTIME_MODULE)
    ));

    out.push_str(&format!(
        "const PACKAGE_NAME = {};\n\n",
        js_string(&package.name)
    ));

    out.push_str("const BINDINGS = Object.freeze({\n");
    for reference in &package.ui_references {
        let binding = resolution.ui_binding(&package.name, reference).ok_or_else(|| {
            GenerateError::UnresolvedReference {
                package: package.name.clone(),
                reference: reference.key(),
            }
        })?;
        out.push_str(&format!(
            "    {}: {},\n",
            js_string(&reference.key()),
            binding_literal(binding)
        ));
    }
    out.push_str("});\n\n");

    out.push_str(
        "\
function bindingKey(interfaceName, qualifier) {
    return qualifier === undefined ? interfaceName : `${interfaceName}:${qualifier}`;
}

export function useService(interfaceName, options) {
    const qualifier = options === undefined ? undefined : options.qualifier;
    const binding = BINDINGS[bindingKey(interfaceName, qualifier)];
    if (binding === undefined || binding.all) {
        throw new ServiceNotFoundError(PACKAGE_NAME, interfaceName, qualifier);
    }
    return lookupService(PACKAGE_NAME, binding.providers[0]);
}

export function useServices(interfaceName) {
    const binding = BINDINGS[interfaceName];
    if (binding === undefined || !binding.all) {
        throw new ServiceNotFoundError(PACKAGE_NAME, interfaceName, undefined);
    }
    return lookupServices(PACKAGE_NAME, binding.providers);
}

export function useProperties() {
    return lookupProperties(PACKAGE_NAME);
}

export function useIntl() {
    return lookupIntl(PACKAGE_NAME);
}
",
    );

    Ok(out)
}

fn binding_literal(binding: &ResolvedBinding) -> String {
    let providers = binding
        .providers
        .iter()
        .map(|p| {
            format!(
                "{{ package: {}, service: {} }}",
                js_string(&p.package),
                js_string(&p.service)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{{ all: {}, providers: [{}] }}",
        binding.reference.all, providers
    )
}
