//! Rigging.toml parsing and schema validation.
//!
//! The config file is the declarative build description for one package:
//! entry points, provided/consumed service interfaces, styles, locales and
//! publish options. Validation recognizes an exact key set and collects
//! every violation before reporting, so a developer sees all offending keys
//! in a single error.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::{Table, Value};

/// Recognized top-level keys of a Rigging.toml file.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "entry_points",
    "styles",
    "i18n",
    "services",
    "services_module",
    "ui",
    "publish_config",
];

/// Reload token for cache-busting config loads.
///
/// A host that re-imports configs on file change passes a fresh generation
/// into [`load_config`]; the token is recorded on the returned config and
/// never kept in any module-level state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Generation(pub u64);

impl Generation {
    /// The next generation token.
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Error loading or validating a package configuration.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("package configuration not found: {}", .path.display())]
    #[diagnostic(
        code(rigging::config::not_found),
        help("Create a Rigging.toml in the package directory")
    )]
    NotFound { path: PathBuf },

    /// The config file could not be read or parsed.
    #[error("failed to load package configuration at {}: {message}", .path.display())]
    #[diagnostic(code(rigging::config::load))]
    Load { path: PathBuf, message: String },

    /// The config shape is invalid. Carries every problem found, not just
    /// the first.
    #[error("invalid package configuration at {}: {}", .path.display(), .problems.join("; "))]
    #[diagnostic(
        code(rigging::config::validation),
        help("Recognized top-level keys: entry_points, styles, i18n, services, services_module, ui, publish_config")
    )]
    Validation {
        path: PathBuf,
        problems: Vec<String>,
    },
}

/// A provided interface: string shorthand or `{ name, qualifier? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProvidesConfig {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualifier: Option<String>,
    },
}

impl ProvidesConfig {
    /// The interface name this entry provides.
    pub fn interface_name(&self) -> &str {
        match self {
            ProvidesConfig::Name(name) => name,
            ProvidesConfig::Detailed { name, .. } => name,
        }
    }

    /// The optional qualifier.
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            ProvidesConfig::Name(_) => None,
            ProvidesConfig::Detailed { qualifier, .. } => qualifier.as_deref(),
        }
    }
}

/// An interface reference: string shorthand or `{ name, qualifier?, all? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceConfig {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualifier: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        all: bool,
    },
}

/// One service declaration under `[services.<name>]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Interfaces this service provides, in declaration order.
    #[serde(default)]
    pub provides: Vec<ProvidesConfig>,

    /// Named references to interfaces this service consumes.
    #[serde(default)]
    pub references: IndexMap<String, ReferenceConfig>,
}

/// The `[ui]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiConfig {
    /// Interfaces the package's UI components consume.
    #[serde(default)]
    pub references: Vec<ReferenceConfig>,
}

/// The `[publish_config]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Escalate packaging warnings to fatal errors.
    #[serde(default)]
    pub strict: bool,

    /// Publish type-declaration artifacts per entry point.
    #[serde(default)]
    pub types: bool,
}

/// A validated package configuration, defaults filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Entry point module names, default `["index"]`.
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,

    /// Optional path to the package's style file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,

    /// Declared locale tags, in order.
    #[serde(default)]
    pub i18n: Vec<String>,

    /// Optional override for the services module path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_module: Option<String>,

    /// Service declarations, in declaration order.
    #[serde(default)]
    pub services: IndexMap<String, ServiceConfig>,

    /// UI references.
    #[serde(default)]
    pub ui: UiConfig,

    /// Publish options.
    #[serde(default)]
    pub publish_config: PublishConfig,

    /// The reload token this config was loaded under.
    #[serde(skip)]
    pub generation: Generation,
}

fn default_entry_points() -> Vec<String> {
    vec!["index".to_string()]
}

/// Load a package configuration from a file path.
///
/// Every call re-reads and re-evaluates the file; results are never cached,
/// so a host reloading on file change always observes fresh content. The
/// function writes no shared state, making independent loads for different
/// files safe to run concurrently.
pub fn load_config(path: &Path, generation: Generation) -> Result<PackageConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_config(&content, path, generation)
}

/// Parse and validate config content.
pub fn parse_config(
    content: &str,
    path: &Path,
    generation: Generation,
) -> Result<PackageConfig, ConfigError> {
    let table: Table = content.parse().map_err(|e: toml::de::Error| ConfigError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let problems = validate_table(&table);
    if !problems.is_empty() {
        return Err(ConfigError::Validation {
            path: path.to_path_buf(),
            problems,
        });
    }

    let mut config: PackageConfig =
        Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Validation {
                path: path.to_path_buf(),
                problems: vec![e.to_string()],
            })?;

    config.generation = generation;
    Ok(config)
}

/// Validate a raw config table against the recognized schema.
///
/// Walks the whole value and returns every violation found: all
/// unrecognized keys (top level and nested) and all type mismatches, so the
/// caller reports them together.
pub fn validate_table(table: &Table) -> Vec<String> {
    let mut problems = Vec::new();

    for key in table.keys() {
        if !RECOGNIZED_KEYS.contains(&key.as_str()) {
            problems.push(format!("unrecognized key `{key}`"));
        }
    }

    if let Some(value) = table.get("entry_points") {
        validate_string_array(value, "entry_points", &mut problems);
    }
    if let Some(value) = table.get("styles") {
        validate_string(value, "styles", &mut problems);
    }
    if let Some(value) = table.get("i18n") {
        validate_string_array(value, "i18n", &mut problems);
    }
    if let Some(value) = table.get("services_module") {
        validate_string(value, "services_module", &mut problems);
    }

    if let Some(value) = table.get("services") {
        match value.as_table() {
            Some(services) => {
                for (name, service) in services {
                    validate_service(name, service, &mut problems);
                }
            }
            None => problems.push("`services` must be a table of service declarations".to_string()),
        }
    }

    if let Some(value) = table.get("ui") {
        match value.as_table() {
            Some(ui) => {
                for key in ui.keys() {
                    if key != "references" {
                        problems.push(format!("unrecognized key `ui.{key}`"));
                    }
                }
                if let Some(references) = ui.get("references") {
                    validate_reference_array(references, "ui.references", &mut problems);
                }
            }
            None => problems.push("`ui` must be a table".to_string()),
        }
    }

    if let Some(value) = table.get("publish_config") {
        match value.as_table() {
            Some(publish) => {
                for (key, entry) in publish {
                    match key.as_str() {
                        "strict" | "types" => {
                            if !entry.is_bool() {
                                problems
                                    .push(format!("`publish_config.{key}` must be a boolean"));
                            }
                        }
                        other => {
                            problems.push(format!("unrecognized key `publish_config.{other}`"))
                        }
                    }
                }
            }
            None => problems.push("`publish_config` must be a table".to_string()),
        }
    }

    problems
}

fn validate_service(name: &str, value: &Value, problems: &mut Vec<String>) {
    if name.is_empty() {
        problems.push("service names must not be empty".to_string());
    }

    let table = match value.as_table() {
        Some(table) => table,
        None => {
            problems.push(format!("`services.{name}` must be a table"));
            return;
        }
    };

    for key in table.keys() {
        if key != "provides" && key != "references" {
            problems.push(format!("unrecognized key `services.{name}.{key}`"));
        }
    }

    if let Some(provides) = table.get("provides") {
        match provides.as_array() {
            Some(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    let at = format!("services.{name}.provides[{i}]");
                    validate_interface_entry(entry, &at, false, problems);
                }
            }
            None => problems.push(format!("`services.{name}.provides` must be an array")),
        }
    }

    if let Some(references) = table.get("references") {
        match references.as_table() {
            Some(entries) => {
                for (ref_name, entry) in entries {
                    if ref_name.is_empty() {
                        problems.push(format!(
                            "reference names in `services.{name}.references` must not be empty"
                        ));
                    }
                    let at = format!("services.{name}.references.{ref_name}");
                    validate_interface_entry(entry, &at, true, problems);
                }
            }
            None => problems.push(format!("`services.{name}.references` must be a table")),
        }
    }
}

fn validate_reference_array(value: &Value, at: &str, problems: &mut Vec<String>) {
    match value.as_array() {
        Some(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                validate_interface_entry(entry, &format!("{at}[{i}]"), true, problems);
            }
        }
        None => problems.push(format!("`{at}` must be an array")),
    }
}

/// Validate one interface entry: a non-empty string shorthand, or a table
/// with `name` (required), `qualifier`, and (for references) `all`.
fn validate_interface_entry(value: &Value, at: &str, is_reference: bool, problems: &mut Vec<String>) {
    match value {
        Value::String(name) => {
            if name.is_empty() {
                problems.push(format!("`{at}`: interface name must not be empty"));
            }
        }
        Value::Table(table) => {
            for (key, entry) in table {
                match key.as_str() {
                    "name" => {
                        match entry.as_str() {
                            Some("") => problems
                                .push(format!("`{at}.name`: interface name must not be empty")),
                            Some(_) => {}
                            None => problems.push(format!("`{at}.name` must be a string")),
                        }
                    }
                    "qualifier" => {
                        if !entry.is_str() {
                            problems.push(format!("`{at}.qualifier` must be a string"));
                        }
                    }
                    "all" if is_reference => {
                        if !entry.is_bool() {
                            problems.push(format!("`{at}.all` must be a boolean"));
                        }
                    }
                    other => problems.push(format!("unrecognized key `{at}.{other}`")),
                }
            }
            if !table.contains_key("name") {
                problems.push(format!("`{at}` is missing required key `name`"));
            }
        }
        _ => problems.push(format!(
            "`{at}` must be an interface name string or a table with a `name` key"
        )),
    }
}

fn validate_string(value: &Value, key: &str, problems: &mut Vec<String>) {
    if !value.is_str() {
        problems.push(format!("`{key}` must be a string"));
    }
}

fn validate_string_array(value: &Value, key: &str, problems: &mut Vec<String>) {
    match value.as_array() {
        Some(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                match entry.as_str() {
                    Some("") => problems.push(format!("`{key}[{i}]` must not be empty")),
                    Some(_) => {}
                    None => problems.push(format!("`{key}[{i}]` must be a string")),
                }
            }
        }
        None => problems.push(format!("`{key}` must be an array of strings")),
    }
}
