//! Element locators resolved through per-class YAML sources.
//!
//! Each class may carry a locator file next to its declaring source
//! (`login_page.rs` → `login_page.yaml`). Files are discovered root to
//! leaf and deep-merged, so lower-level classes take priority at equal
//! dotted paths. Locators are mandatory where asked for: a missing path
//! fails loudly rather than degrading to a default.

use std::collections::BTreeMap;

use crate::hierarchy::{PageClassId, PageGraph, WalkOrder};
use crate::resolver::{merge_deep, normalize_locator_key, LocatorNode};
use crate::result::{PaginaError, PaginaResult};

/// Merged locator table for one declaring scope; immutable once built.
#[derive(Debug)]
pub struct LocatorResolver {
    page: String,
    merged: BTreeMap<String, LocatorNode>,
}

impl LocatorResolver {
    /// Gather and merge the locator files of the class's hierarchy.
    pub fn build(graph: &PageGraph, class: PageClassId) -> PaginaResult<Self> {
        let page = graph.class(class).name.clone();
        let mut merged = BTreeMap::new();
        let order = WalkOrder {
            top_to_bottom: true,
            ..WalkOrder::default()
        };
        for ancestor in graph.ancestors(class, order) {
            let declared = graph.class(ancestor);
            let Some(path) = declared.locator_path() else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            let path_str = path.display().to_string();
            let text =
                std::fs::read_to_string(&path).map_err(|e| PaginaError::LocatorSource {
                    path: path_str.clone(),
                    message: e.to_string(),
                })?;
            let parsed: serde_yaml_ng::Value =
                serde_yaml_ng::from_str(&text).map_err(|e| PaginaError::LocatorSource {
                    path: path_str.clone(),
                    message: e.to_string(),
                })?;
            if parsed.is_null() {
                tracing::warn!(path = %path_str, "empty locator file; delete it if not needed");
                continue;
            }
            let table = LocatorNode::table_from_yaml(&parsed, &path_str)?;
            tracing::debug!(path = %path_str, keys = table.len(), "merged locator source");
            merge_deep(&mut merged, table);
        }
        Ok(Self { page, merged })
    }

    /// Resolve a dotted locator key to its concrete value.
    ///
    /// The key is normalized (spaces fold to underscores, lower-cased)
    /// and walked segment by segment. A missing segment, or a terminal
    /// that is itself a nested table, is an error naming the key and the
    /// owning page.
    pub fn get(&self, key: &str) -> PaginaResult<&str> {
        let normalized = normalize_locator_key(key);
        let not_found = || PaginaError::LocatorNotFound {
            key: normalized.clone(),
            page: self.page.clone(),
        };
        let mut current: Option<&LocatorNode> = None;
        let mut table = Some(&self.merged);
        for segment in normalized.split('.') {
            let node = table.and_then(|t| t.get(segment)).ok_or_else(not_found)?;
            table = match node {
                LocatorNode::Table(t) => Some(t),
                LocatorNode::Value(_) => None,
            };
            current = Some(node);
        }
        match current {
            Some(LocatorNode::Value(value)) => Ok(value),
            _ => Err(not_found()),
        }
    }

    /// Whether the dotted key resolves to a concrete value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// The full merged locator table.
    #[must_use]
    pub fn all(&self) -> &BTreeMap<String, LocatorNode> {
        &self.merged
    }

    /// External name of the page the resolver was built for.
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::hierarchy::PageClassSpec;
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    /// Root class with `common_page.yaml`, leaf with `login_page.yaml`.
    fn two_level(dir: &Path) -> (PageGraph, PageClassId) {
        let mut g = PageGraph::new();
        let root = g.register(
            PageClassSpec::new("CommonPage").source(dir.join("common_page.rs")),
        );
        let leaf = g.register(
            PageClassSpec::new("LoginPage")
                .parent(root)
                .source(dir.join("login_page.rs")),
        );
        (g, leaf)
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_leaf_class_takes_priority() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "common_page.yaml", "master: css=#root\n");
            write(
                dir.path(),
                "login_page.yaml",
                "master: css=#leaf\nextra: css=#x\n",
            );
            let (g, leaf) = two_level(dir.path());
            let resolver = LocatorResolver::build(&g, leaf).unwrap();
            assert_eq!(resolver.get("master").unwrap(), "css=#leaf");
            assert_eq!(resolver.get("extra").unwrap(), "css=#x");
        }

        #[test]
        fn test_nested_tables_merge_recursively() {
            let dir = tempfile::tempdir().unwrap();
            write(
                dir.path(),
                "common_page.yaml",
                "nav:\n  home: css=#home\n  help: css=#help\n",
            );
            write(dir.path(), "login_page.yaml", "nav:\n  help: css=#leaf-help\n");
            let (g, leaf) = two_level(dir.path());
            let resolver = LocatorResolver::build(&g, leaf).unwrap();
            assert_eq!(resolver.get("nav.home").unwrap(), "css=#home");
            assert_eq!(resolver.get("nav.help").unwrap(), "css=#leaf-help");
        }

        #[test]
        fn test_missing_files_are_fine_and_empty_file_warns() {
            let dir = tempfile::tempdir().unwrap();
            // Only the leaf file exists, and it is empty.
            write(dir.path(), "login_page.yaml", "");
            let (g, leaf) = two_level(dir.path());
            let resolver = LocatorResolver::build(&g, leaf).unwrap();
            assert!(resolver.all().is_empty());
        }

        #[test]
        fn test_unparseable_file_fails_with_path() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "login_page.yaml", "master: [unclosed\n");
            let (g, leaf) = two_level(dir.path());
            let err = LocatorResolver::build(&g, leaf).unwrap_err();
            assert!(matches!(err, PaginaError::LocatorSource { .. }));
            assert!(err.to_string().contains("login_page.yaml"));
        }
    }

    mod lookup_tests {
        use super::*;

        fn resolver_with(dir: &Path, yaml: &str) -> LocatorResolver {
            write(dir, "login_page.yaml", yaml);
            let (g, leaf) = two_level(dir);
            LocatorResolver::build(&g, leaf).unwrap()
        }

        #[test]
        fn test_missing_key_names_key_and_page() {
            let dir = tempfile::tempdir().unwrap();
            let resolver = resolver_with(dir.path(), "master: css=#m\n");
            let err = resolver.get("absent").unwrap_err();
            let message = err.to_string();
            assert!(message.contains("absent"));
            assert!(message.contains("Login Page"));
        }

        #[test]
        fn test_partial_path_to_table_fails() {
            let dir = tempfile::tempdir().unwrap();
            let resolver = resolver_with(dir.path(), "nav:\n  home: css=#home\n");
            assert!(resolver.get("nav").is_err());
            assert_eq!(resolver.get("nav.home").unwrap(), "css=#home");
        }

        #[test]
        fn test_key_normalization() {
            let dir = tempfile::tempdir().unwrap();
            let resolver = resolver_with(dir.path(), "search_button: css=#s\n");
            assert_eq!(resolver.get("Search Button").unwrap(), "css=#s");
            assert!(resolver.has("search_button"));
        }

        #[test]
        fn test_path_beyond_value_fails() {
            let dir = tempfile::tempdir().unwrap();
            let resolver = resolver_with(dir.path(), "master: css=#m\n");
            assert!(resolver.get("master.deeper").is_err());
        }
    }
}
