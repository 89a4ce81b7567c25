//! Locale loader module.
//!
//! One lazy-load case per declared locale; requesting an undeclared locale
//! throws `UnsupportedLocaleError` at runtime. The declared locale order is
//! preserved in the emitted text.

use crate::codegen::{header, js_string, RUNTIME_MODULE};
use crate::core::package::PackageMetadata;

/// Generate the locale loader module for one package.
pub fn generate_locale_loader(package: &PackageMetadata) -> String {
    let mut out = header(&package.name);

    out.push_str(&format!(
        "import {{ UnsupportedLocaleError }} from {};\n\n",
        js_string(RUNTIME_MODULE)
    ));

    out.push_str(&format!(
        "const PACKAGE_NAME = {};\n\n",
        js_string(&package.name)
    ));

    let locale_list = package
        .locales
        .iter()
        .map(|l| js_string(l))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "export const locales = Object.freeze([{locale_list}]);\n\n"
    ));

    out.push_str("const LOADERS = Object.freeze({\n");
    for locale in &package.locales {
        out.push_str(&format!(
            "    {}: () => import({}),\n",
            js_string(locale),
            js_string(&format!("./i18n/{locale}.yaml"))
        ));
    }
    out.push_str("});\n\n");

    out.push_str(
        "\
export function loadLocale(locale) {
    const loader = LOADERS[locale];
    if (loader === undefined) {
        throw new UnsupportedLocaleError(PACKAGE_NAME, locale, locales);
    }
    return loader();
}
",
    );

    out
}

#[cfg(test)]
mod tests {
    use crate::codegen::tests::test_workspace;
    use crate::codegen::{generate, GenerateContext, ModuleKind};
    use crate::resolver::resolve_workspace;

    #[test]
    fn test_locale_loader_has_one_case_per_locale() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "map-widgets",
        };

        let text = generate(ModuleKind::LocaleLoader, &ctx).unwrap();
        assert!(text.contains("export const locales = Object.freeze([\"de\", \"en\"]);"));
        assert!(text.contains("\"de\": () => import(\"./i18n/de.yaml\")"));
        assert!(text.contains("\"en\": () => import(\"./i18n/en.yaml\")"));

        // Undeclared locales route to the runtime error; "fr" has no case.
        assert!(!text.contains("\"fr\""));
        assert!(text.contains("throw new UnsupportedLocaleError(PACKAGE_NAME, locale, locales);"));
    }

    #[test]
    fn test_locale_loader_for_package_without_locales() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "log-impl",
        };

        let text = generate(ModuleKind::LocaleLoader, &ctx).unwrap();
        assert!(text.contains("export const locales = Object.freeze([]);"));
        assert!(text.contains("const LOADERS = Object.freeze({\n});"));
    }
}
