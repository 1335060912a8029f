//! Layered configuration options resolved through the page hierarchy.
//!
//! Sources in ascending precedence: the external variable file, `PO_`
//! environment variables, the host runtime's variable table when a host
//! is attached, and static options declared on classes from root to leaf
//! (a subclass overrides its ancestors). The asymmetry — class statics
//! beat host variables, host variables beat the environment — mirrors
//! the documented order and is kept as-is.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::context::HostRuntime;
use crate::hierarchy::{PageClassId, PageGraph, WalkOrder};
use crate::resolver::{merge_flat, normalize_option_key, Layer, OptionValue};
use crate::result::{PaginaError, PaginaResult};

/// Prefix recognized on environment variables, stripped before use.
pub const ENV_PREFIX: &str = "PO_";

/// Environment variable naming the external variable file.
pub const VAR_FILE_ENV: &str = "PO_VAR_FILE";

/// Snapshot of the process environment consumed by the options resolver.
///
/// Injectable so tests (and embedders) can resolve options without
/// mutating the real environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: BTreeMap<String, String>,
    var_file: Option<PathBuf>,
}

impl EnvConfig {
    /// Capture the live process environment.
    #[must_use]
    pub fn from_process() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars().collect();
        let var_file = vars.get(VAR_FILE_ENV).map(PathBuf::from);
        Self { vars, var_file }
    }

    /// An empty environment.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add one environment variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.vars.insert(key.into(), value.into());
        self
    }

    /// Point at an external variable file.
    #[must_use]
    pub fn with_var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_file = Some(path.into());
        self
    }

    /// The configured variable-file path, if any.
    #[must_use]
    pub fn var_file(&self) -> Option<&PathBuf> {
        self.var_file.as_ref()
    }
}

/// Merged option table for one declaring scope; immutable once built.
#[derive(Debug)]
pub struct OptionsResolver {
    merged: BTreeMap<String, OptionValue>,
    host_active: bool,
}

impl OptionsResolver {
    /// Resolve options for the page class, layering all four sources.
    pub fn build(
        graph: &PageGraph,
        class: PageClassId,
        host: Option<&dyn HostRuntime>,
        env: &EnvConfig,
    ) -> PaginaResult<Self> {
        let mut layers = Vec::new();
        if let Some(layer) = var_file_layer(env)? {
            layers.push(layer);
        }
        layers.push(env_layer(env));
        if let Some(host) = host {
            layers.push(host_layer(host));
        }
        let order = WalkOrder {
            top_to_bottom: true,
            ..WalkOrder::default()
        };
        for ancestor in graph.ancestors(class, order) {
            let declared = graph.class(ancestor);
            if declared.options.is_empty() {
                continue;
            }
            let mut layer = Layer::new(declared.type_name.clone());
            for (key, value) in &declared.options {
                layer.insert(normalize_option_key(key), value.clone());
            }
            layers.push(layer);
        }
        Ok(Self {
            merged: merge_flat(&layers),
            host_active: host.is_some(),
        })
    }

    /// Look up an option by normalized name; `None` when absent, never a
    /// partial match. Outside a host context, spaces in the requested
    /// name fold to underscores before normalization.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        let key = if self.host_active {
            normalize_option_key(name)
        } else {
            normalize_option_key(&name.replace(' ', "_"))
        };
        self.merged.get(&key)
    }

    /// Look up an option, falling back to `default` when absent.
    #[must_use]
    pub fn get_or(&self, name: &str, default: OptionValue) -> OptionValue {
        self.get(name).cloned().unwrap_or(default)
    }

    /// Look up a scalar option rendered as a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            OptionValue::String(s) => Some(s.clone()),
            OptionValue::Number(n) => Some(n.to_string()),
            OptionValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Number of resolved options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Whether no options resolved at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Read the external variable file into a layer. A missing or
/// unparseable file is fatal; keys starting with `_` are skipped.
fn var_file_layer(env: &EnvConfig) -> PaginaResult<Option<Layer>> {
    let Some(path) = env.var_file() else {
        return Ok(None);
    };
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| PaginaError::VarFileImport {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let parsed: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(&text).map_err(|e| PaginaError::VarFileImport {
            path: display.clone(),
            message: e.to_string(),
        })?;
    let serde_yaml_ng::Value::Mapping(mapping) = parsed else {
        return Err(PaginaError::VarFileImport {
            path: display,
            message: "expected a mapping of variable names to values".to_string(),
        });
    };
    let mut layer = Layer::new(format!("var file {display}"));
    for (key, value) in &mapping {
        let Some(key) = key.as_str() else {
            return Err(PaginaError::VarFileImport {
                path: display,
                message: "variable names must be strings".to_string(),
            });
        };
        if key.starts_with('_') {
            continue;
        }
        let value = serde_json::to_value(value).map_err(|e| PaginaError::VarFileImport {
            path: display.clone(),
            message: e.to_string(),
        })?;
        layer.insert(normalize_option_key(key), value);
    }
    Ok(Some(layer))
}

/// Collect `PO_`-prefixed, upper-cased environment variables.
fn env_layer(env: &EnvConfig) -> Layer {
    let mut layer = Layer::new("environment");
    for (key, value) in &env.vars {
        if key.starts_with(ENV_PREFIX) && key == &key.to_uppercase() {
            let name = &key[ENV_PREFIX.len()..];
            layer.insert(
                normalize_option_key(name),
                OptionValue::String(value.clone()),
            );
        }
    }
    layer
}

/// Collect the host runtime's live variable table.
fn host_layer(host: &dyn HostRuntime) -> Layer {
    let mut layer = Layer::new("host runtime");
    for (key, value) in host.variables() {
        layer.insert(normalize_option_key(&key), value);
    }
    layer
}
