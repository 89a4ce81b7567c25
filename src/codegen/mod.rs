//! Virtual module generation.
//!
//! Emits deterministic ECMAScript source text for the glue modules that
//! wire application code to resolved service bindings. Generation is an
//! explicit `generate(kind, context)` contract, decoupled from any bundler
//! plugin API: the hosting bundler decides *when* a virtual module is
//! requested, this module decides *what* its text is. Identical
//! (resolved-bindings, locale-set) input always yields byte-identical
//! output, so the text is safe to cache and to snapshot-test.

pub mod app_metadata;
pub mod hooks;
pub mod i18n;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::package::PackageMetadata;
use crate::core::workspace::Workspace;
use crate::resolver::Resolution;

/// Module specifier of the external runtime the generated text imports
/// from. The runtime service container is a collaborator, not part of this
/// crate.
pub const RUNTIME_MODULE: &str = "@rigging/runtime";

/// The kinds of virtual module this generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Typed service accessors for one package's UI references.
    ServiceHooks,
    /// The serialized resolved package/service graph for the whole app.
    AppMetadata,
    /// Lazy locale loading for one package's declared locales.
    LocaleLoader,
    /// A constant identifying the owning package, for diagnostics.
    SourceInfo,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleKind::ServiceHooks => "service-hooks",
            ModuleKind::AppMetadata => "app-metadata",
            ModuleKind::LocaleLoader => "locale-loader",
            ModuleKind::SourceInfo => "source-info",
        };
        write!(f, "{name}")
    }
}

/// Error producing a virtual module.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The requested package is not part of the workspace.
    #[error("unknown package `{name}` in generation request")]
    UnknownPackage { name: String },

    /// The resolution passed in does not cover a reference the package
    /// declares; the caller mixed metadata and resolution from different
    /// workspace states.
    #[error("no resolved binding for `{reference}` of package `{package}`")]
    UnresolvedReference { package: String, reference: String },

    /// Metadata serialization failed.
    #[error("failed to serialize application metadata")]
    Serialize(#[from] serde_json::Error),
}

/// The resolution scope a virtual module is generated against.
#[derive(Debug, Clone, Copy)]
pub struct GenerateContext<'a> {
    pub workspace: &'a Workspace,
    pub resolution: &'a Resolution,
    /// The consuming package. A package only sees bindings for references
    /// it declared itself.
    pub package: &'a str,
}

impl<'a> GenerateContext<'a> {
    fn package_metadata(&self) -> Result<&'a PackageMetadata, GenerateError> {
        self.workspace
            .package(self.package)
            .ok_or_else(|| GenerateError::UnknownPackage {
                name: self.package.to_string(),
            })
    }
}

/// Produce the source text of one virtual module.
pub fn generate(kind: ModuleKind, ctx: &GenerateContext<'_>) -> Result<String, GenerateError> {
    let package = ctx.package_metadata()?;

    match kind {
        ModuleKind::ServiceHooks => hooks::generate_hooks(package, ctx.resolution),
        ModuleKind::AppMetadata => app_metadata::generate_app_metadata(ctx.workspace, ctx.resolution),
        ModuleKind::LocaleLoader => Ok(i18n::generate_locale_loader(package)),
        ModuleKind::SourceInfo => Ok(generate_source_info(package)),
    }
}

/// Source-info module: a constant identifying the owning package.
fn generate_source_info(package: &PackageMetadata) -> String {
    let mut out = header(&package.name);
    out.push_str(&format!(
        "export const sourceId = {};\n",
        js_string(&package.name)
    ));
    out
}

/// Shared banner for generated modules.
pub(crate) fn header(package: &str) -> String {
    format!("// Generated by rig for package {}. Do not edit.\n", js_string(package))
}

/// Render a string as a JS string literal.
pub(crate) fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Lazy, memoizing store for generated module text.
///
/// Text is produced only when first requested and keyed by (kind, package,
/// resolution fingerprint), so an unchanged graph never regenerates and a
/// changed graph never serves stale text.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: HashMap<ModuleKey, Arc<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ModuleKey {
    kind: ModuleKind,
    package: String,
    fingerprint: String,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        ModuleCache::default()
    }

    /// Return the module text, generating it on first request.
    pub fn get_or_generate(
        &mut self,
        kind: ModuleKind,
        ctx: &GenerateContext<'_>,
    ) -> Result<Arc<String>, GenerateError> {
        let key = ModuleKey {
            kind,
            package: ctx.package.to_string(),
            fingerprint: ctx.resolution.fingerprint().to_string(),
        };

        if let Some(text) = self.modules.get(&key) {
            return Ok(Arc::clone(text));
        }

        tracing::debug!("generating {kind} module for package `{}`", ctx.package);
        let text = Arc::new(generate(kind, ctx)?);
        self.modules.insert(key, Arc::clone(&text));
        Ok(text)
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{parse_config, Generation};
    use crate::core::package::PackageMetadata;
    use crate::resolver::resolve_workspace;
    use std::path::Path;

    pub(crate) fn test_workspace() -> Workspace {
        let mut ws = Workspace::new();
        for (name, content) in [
            (
                "log-impl",
                r#"
[services.ConsoleLogger]
provides = ["logging.Logger"]
"#,
            ),
            (
                "map-widgets",
                r#"
i18n = ["de", "en"]

[ui]
references = ["logging.Logger"]
"#,
            ),
        ] {
            let config =
                parse_config(content, Path::new("/ws/Rigging.toml"), Generation(0)).unwrap();
            ws.add_package(PackageMetadata::from_config(name, format!("/ws/{name}"), &config))
                .unwrap();
        }
        ws
    }

    #[test]
    fn test_generate_unknown_package_fails() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "nope",
        };

        let err = generate(ModuleKind::SourceInfo, &ctx).unwrap_err();
        assert!(matches!(err, GenerateError::UnknownPackage { .. }));
    }

    #[test]
    fn test_source_info_module() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "map-widgets",
        };

        let text = generate(ModuleKind::SourceInfo, &ctx).unwrap();
        assert!(text.contains("export const sourceId = \"map-widgets\";"));
    }

    #[test]
    fn test_generation_is_byte_identical() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "map-widgets",
        };

        for kind in [
            ModuleKind::ServiceHooks,
            ModuleKind::AppMetadata,
            ModuleKind::LocaleLoader,
            ModuleKind::SourceInfo,
        ] {
            let first = generate(kind, &ctx).unwrap();
            let second = generate(kind, &ctx).unwrap();
            assert_eq!(first, second, "{kind} output must be deterministic");
        }
    }

    #[test]
    fn test_module_cache_is_lazy_and_reuses_text() {
        let ws = test_workspace();
        let resolution = resolve_workspace(&ws).unwrap();
        let ctx = GenerateContext {
            workspace: &ws,
            resolution: &resolution,
            package: "map-widgets",
        };

        let mut cache = ModuleCache::new();
        assert!(cache.is_empty());

        let first = cache.get_or_generate(ModuleKind::ServiceHooks, &ctx).unwrap();
        let second = cache.get_or_generate(ModuleKind::ServiceHooks, &ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(js_string("a\nb"), "\"a\\nb\"");
    }
}
