//! Generic layered-merge engine behind the options and locator resolvers.
//!
//! A resolver is built from an ordered list of [`Layer`]s; later layers
//! overwrite earlier ones key-for-key. Flat merges back the options
//! resolver; the recursive variant backs the locator resolver, where a
//! leaf class overrides an ancestor at the same dotted path without
//! clobbering the ancestor's siblings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::{PaginaError, PaginaResult};

/// Value type for options: any JSON-representable scalar or structure.
pub type OptionValue = serde_json::Value;

/// One named source of key/value pairs, e.g. "env" or a class name.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Origin label, used in trace output only
    pub origin: String,
    /// Normalized key to value mapping contributed by this origin
    pub values: BTreeMap<String, OptionValue>,
}

impl Layer {
    /// Create a layer with the given origin label.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            values: BTreeMap::new(),
        }
    }

    /// Insert a value under an already-normalized key.
    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        let _ = self.values.insert(key.into(), value);
    }
}

/// Merge layers in ascending precedence: later layers win key-for-key.
#[must_use]
pub fn merge_flat(layers: &[Layer]) -> BTreeMap<String, OptionValue> {
    let mut merged = BTreeMap::new();
    for layer in layers {
        tracing::debug!(origin = %layer.origin, keys = layer.values.len(), "merging option layer");
        for (key, value) in &layer.values {
            let _ = merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Node in a merged locator table: either a concrete locator string or a
/// nested table addressed by the next dotted-path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocatorNode {
    /// A concrete locator value
    Value(String),
    /// A nested table of locators
    Table(BTreeMap<String, LocatorNode>),
}

impl LocatorNode {
    /// Convert a parsed YAML document into a locator table.
    ///
    /// Scalars render to their string form; sequences have no dotted-path
    /// address and are rejected with the offending file's path.
    pub fn table_from_yaml(
        value: &serde_yaml_ng::Value,
        path: &str,
    ) -> PaginaResult<BTreeMap<String, LocatorNode>> {
        match value {
            serde_yaml_ng::Value::Mapping(mapping) => {
                let mut table = BTreeMap::new();
                for (key, entry) in mapping {
                    let key = yaml_key_to_string(key, path)?;
                    let _ = table.insert(normalize_locator_key(&key), Self::from_yaml(entry, path)?);
                }
                Ok(table)
            }
            other => Err(PaginaError::LocatorSource {
                path: path.to_string(),
                message: format!("expected a mapping at the top level, found {}", yaml_kind(other)),
            }),
        }
    }

    fn from_yaml(value: &serde_yaml_ng::Value, path: &str) -> PaginaResult<Self> {
        match value {
            serde_yaml_ng::Value::String(s) => Ok(Self::Value(s.clone())),
            serde_yaml_ng::Value::Number(n) => Ok(Self::Value(n.to_string())),
            serde_yaml_ng::Value::Bool(b) => Ok(Self::Value(b.to_string())),
            serde_yaml_ng::Value::Mapping(_) => {
                Ok(Self::Table(Self::table_from_yaml(value, path)?))
            }
            other => Err(PaginaError::LocatorSource {
                path: path.to_string(),
                message: format!("unsupported locator value of kind {}", yaml_kind(other)),
            }),
        }
    }
}

fn yaml_key_to_string(key: &serde_yaml_ng::Value, path: &str) -> PaginaResult<String> {
    match key {
        serde_yaml_ng::Value::String(s) => Ok(s.clone()),
        serde_yaml_ng::Value::Number(n) => Ok(n.to_string()),
        other => Err(PaginaError::LocatorSource {
            path: path.to_string(),
            message: format!("unsupported mapping key of kind {}", yaml_kind(other)),
        }),
    }
}

fn yaml_kind(value: &serde_yaml_ng::Value) -> &'static str {
    match value {
        serde_yaml_ng::Value::Null => "null",
        serde_yaml_ng::Value::Bool(_) => "bool",
        serde_yaml_ng::Value::Number(_) => "number",
        serde_yaml_ng::Value::String(_) => "string",
        serde_yaml_ng::Value::Sequence(_) => "sequence",
        serde_yaml_ng::Value::Mapping(_) => "mapping",
        serde_yaml_ng::Value::Tagged(_) => "tagged value",
    }
}

/// Recursively merge `incoming` into `target`; lower-level (later)
/// sources take priority at equal dotted paths. Two tables merge
/// entry-wise; any other combination is replaced wholesale.
pub fn merge_deep(
    target: &mut BTreeMap<String, LocatorNode>,
    incoming: BTreeMap<String, LocatorNode>,
) {
    for (key, node) in incoming {
        match (target.get_mut(&key), node) {
            (Some(LocatorNode::Table(existing)), LocatorNode::Table(new)) => {
                merge_deep(existing, new);
            }
            (_, node) => {
                let _ = target.insert(key, node);
            }
        }
    }
}

/// Normalize an option key: lower-case it and strip enclosing template
/// markers, so `${BROWSER}` and `browser` compare equal.
#[must_use]
pub fn normalize_option_key(raw: &str) -> String {
    let name = raw.to_lowercase();
    if let (Some(start), Some(end)) = (name.find("${"), name.rfind('}')) {
        if start + 2 < end {
            return name[start + 2..end].to_string();
        }
    }
    name
}

/// Normalize a locator key: fold spaces to underscores and lower-case.
#[must_use]
pub fn normalize_locator_key(raw: &str) -> String {
    raw.replace(' ', "_").to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod flat_merge_tests {
        use super::*;

        #[test]
        fn test_later_layers_win() {
            let mut low = Layer::new("var file");
            low.insert("a", json!(1));
            low.insert("only_low", json!("keep"));
            let mut high = Layer::new("env");
            high.insert("a", json!(2));
            let merged = merge_flat(&[low, high]);
            assert_eq!(merged.get("a"), Some(&json!(2)));
            assert_eq!(merged.get("only_low"), Some(&json!("keep")));
        }

        #[test]
        fn test_empty_layers() {
            assert!(merge_flat(&[]).is_empty());
            assert!(merge_flat(&[Layer::new("nothing")]).is_empty());
        }
    }

    mod deep_merge_tests {
        use super::*;

        fn table_of(yaml: &str) -> BTreeMap<String, LocatorNode> {
            let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).unwrap();
            LocatorNode::table_from_yaml(&value, "test.yaml").unwrap()
        }

        #[test]
        fn test_leaf_overrides_at_same_path() {
            let mut root = table_of("master: css=#root\nshared:\n  header: css=#h\n");
            let leaf = table_of("master: css=#leaf\nshared:\n  footer: css=#f\n");
            merge_deep(&mut root, leaf);
            assert_eq!(
                root.get("master"),
                Some(&LocatorNode::Value("css=#leaf".to_string()))
            );
            let shared = match root.get("shared").unwrap() {
                LocatorNode::Table(t) => t,
                LocatorNode::Value(_) => panic!("expected table"),
            };
            // Sibling from the root layer survives the nested override.
            assert!(shared.contains_key("header"));
            assert!(shared.contains_key("footer"));
        }

        #[test]
        fn test_scalar_replaces_table_wholesale() {
            let mut root = table_of("slot:\n  inner: css=#i\n");
            let leaf = table_of("slot: css=#flat\n");
            merge_deep(&mut root, leaf);
            assert_eq!(
                root.get("slot"),
                Some(&LocatorNode::Value("css=#flat".to_string()))
            );
        }

        #[test]
        fn test_sequence_rejected() {
            let value: serde_yaml_ng::Value = serde_yaml_ng::from_str("bad:\n  - one\n").unwrap();
            let err = LocatorNode::table_from_yaml(&value, "pages/login.yaml");
            assert!(err.is_err());
            let message = err.unwrap_err().to_string();
            assert!(message.contains("pages/login.yaml"));
        }
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_option_key_strips_markers_and_case() {
            assert_eq!(normalize_option_key("${BROWSER}"), "browser");
            assert_eq!(normalize_option_key("BaseURL"), "baseurl");
            assert_eq!(normalize_option_key("plain"), "plain");
        }

        #[test]
        fn test_unclosed_marker_left_alone() {
            assert_eq!(normalize_option_key("${broken"), "${broken");
        }

        #[test]
        fn test_locator_key_folds_spaces() {
            assert_eq!(normalize_locator_key("Search Button"), "search_button");
        }
    }
}
