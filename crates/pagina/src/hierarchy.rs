//! Page-class hierarchy graph and traversal.
//!
//! Page classes form a directed acyclic graph with multiple inheritance:
//! each class lists its parents, and the graph keeps the reverse (child)
//! edges so pages can also be found from the root downwards. Traversal is
//! a plain explicit-stack walk over the arena; no runtime reflection is
//! involved — classes declare everything up front in a [`PageClassSpec`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::keywords::OperationDescriptor;
use crate::resolver::OptionValue;

/// Index of a page class inside a [`PageGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageClassId(pub(crate) usize);

/// Role of a class inside the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRole {
    /// An ordinary page-object class
    Page,
    /// The designated root marker (the base page type)
    Base,
    /// The wrapped automation-capability base
    Automation,
    /// A logging capability; never contributes keywords
    Logging,
}

/// Declared description of one page class.
///
/// The external `name` defaults to a title-cased form of the type name
/// ("LoginPage" becomes "Login Page"). The `origin` identifies the
/// module that declared the class and keys the per-scope resolver caches.
#[derive(Debug)]
pub struct PageClass {
    /// Rust-side type name, unique within the graph by convention
    pub type_name: String,
    /// External name the page is exposed under
    pub name: String,
    /// Class-level description, surfaced by the documentation hook
    pub doc: String,
    /// URI fragment appended to the base URL when navigating here
    pub uri: Option<String>,
    /// Static options declared on the class (normalized keys)
    pub options: BTreeMap<String, OptionValue>,
    /// Path of the file that declared the class, if any; sibling locator
    /// and resource files are derived from it
    pub source: Option<PathBuf>,
    /// Declaring module; classes sharing an origin share resolvers
    pub origin: String,
    /// Role of the class in discovery and filtering
    pub role: ClassRole,
    /// Direct parent classes
    pub parents: Vec<PageClassId>,
    /// Operations the class contributes to keyword discovery
    pub operations: Vec<OperationDescriptor>,
}

impl PageClass {
    /// Path of the locator source associated with this class, derived by
    /// swapping the source file's extension for `yaml`.
    pub fn locator_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|p| p.with_extension("yaml"))
    }

    /// Path of the host resource file associated with this class, derived
    /// by swapping the source file's extension for `resource`.
    pub fn resource_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|p| p.with_extension("resource"))
    }
}

/// Builder for registering a page class into a [`PageGraph`].
#[derive(Debug)]
pub struct PageClassSpec {
    type_name: String,
    name: Option<String>,
    doc: String,
    uri: Option<String>,
    options: BTreeMap<String, OptionValue>,
    source: Option<PathBuf>,
    origin: Option<String>,
    role: ClassRole,
    parents: Vec<PageClassId>,
    operations: Vec<OperationDescriptor>,
}

impl PageClassSpec {
    /// Start describing a class with the given type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            doc: String::new(),
            uri: None,
            options: BTreeMap::new(),
            source: None,
            origin: None,
            role: ClassRole::Page,
            parents: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Override the external name (defaults to the title-cased type name).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the class-level description.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Set the URI fragment for this page.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Declare a static option on the class.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        let _ = self.options.insert(key.into(), value);
        self
    }

    /// Record the file the class was declared in; locator and resource
    /// files are looked for next to it.
    #[must_use]
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Override the declaring origin (defaults to the type name).
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the class role.
    #[must_use]
    pub fn role(mut self, role: ClassRole) -> Self {
        self.role = role;
        self
    }

    /// Add a direct parent class.
    #[must_use]
    pub fn parent(mut self, parent: PageClassId) -> Self {
        self.parents.push(parent);
        self
    }

    /// Add an operation the class contributes to discovery.
    #[must_use]
    pub fn operation(mut self, op: OperationDescriptor) -> Self {
        self.operations.push(op);
        self
    }
}

/// Flags steering an ancestor walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkOrder {
    /// Include the starting class itself
    pub include_self: bool,
    /// Return the sequence root-first instead of leaf-first
    pub top_to_bottom: bool,
    /// Include the designated root marker class (and walk past it)
    pub include_root: bool,
}

impl Default for WalkOrder {
    fn default() -> Self {
        Self {
            include_self: true,
            top_to_bottom: false,
            include_root: false,
        }
    }
}

/// Arena of page-class descriptors with parent and child adjacency.
#[derive(Debug, Default)]
pub struct PageGraph {
    classes: Vec<PageClass>,
    children: Vec<Vec<PageClassId>>,
    base: Option<PageClassId>,
}

impl PageGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class described by `spec` and return its id.
    ///
    /// A `Page`-role class registered with no explicit parents inherits
    /// the designated base class when one is set.
    pub fn register(&mut self, spec: PageClassSpec) -> PageClassId {
        let id = PageClassId(self.classes.len());
        let name = spec.name.unwrap_or_else(|| titleize(&spec.type_name));
        let origin = spec.origin.unwrap_or_else(|| spec.type_name.clone());
        let mut parents = spec.parents;
        if parents.is_empty() && spec.role == ClassRole::Page {
            if let Some(base) = self.base {
                parents.push(base);
            }
        }
        for parent in &parents {
            self.children[parent.0].push(id);
        }
        self.classes.push(PageClass {
            type_name: spec.type_name,
            name,
            doc: spec.doc,
            uri: spec.uri,
            options: spec.options,
            source: spec.source,
            origin,
            role: spec.role,
            parents,
            operations: spec.operations,
        });
        self.children.push(Vec::new());
        id
    }

    /// Mark `id` as the root marker class.
    pub fn set_base(&mut self, id: PageClassId) {
        self.base = Some(id);
    }

    /// The designated root marker class, if one was set.
    #[must_use]
    pub fn base(&self) -> Option<PageClassId> {
        self.base
    }

    /// Look up a class descriptor.
    #[must_use]
    pub fn class(&self, id: PageClassId) -> &PageClass {
        &self.classes[id.0]
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the graph has no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Enumerate the ancestors of `start`.
    ///
    /// Depth-first over parent edges with an explicit stack. A class is
    /// visited at most once, so diamond-shaped multiple inheritance with
    /// shared ancestors still terminates and yields each ancestor exactly
    /// once. The root marker is skipped, and not expanded past, unless
    /// `include_root` is set. Natural order is leaf-first; the sequence
    /// is reversed when `top_to_bottom` is requested.
    #[must_use]
    pub fn ancestors(&self, start: PageClassId, order: WalkOrder) -> Vec<PageClassId> {
        let mut found = Vec::new();
        let mut seen = vec![false; self.classes.len()];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if Some(current) == self.base && !order.include_root {
                continue;
            }
            if seen[current.0] {
                continue;
            }
            seen[current.0] = true;
            if current != start || order.include_self {
                found.push(current);
            }
            for &parent in &self.classes[current.0].parents {
                if !seen[parent.0] {
                    stack.push(parent);
                }
            }
        }
        if order.top_to_bottom {
            found.reverse();
        }
        found
    }

    /// Enumerate the descendants of `start`, de-duplicated the same way
    /// as [`PageGraph::ancestors`]. Natural order is root-first; pass
    /// `top_to_bottom = false` to reverse it.
    #[must_use]
    pub fn descendants(
        &self,
        start: PageClassId,
        include_self: bool,
        top_to_bottom: bool,
    ) -> Vec<PageClassId> {
        let mut found = Vec::new();
        let mut seen = vec![false; self.classes.len()];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if seen[current.0] {
                continue;
            }
            seen[current.0] = true;
            if current != start || include_self {
                found.push(current);
            }
            for &child in &self.children[current.0] {
                if !seen[child.0] {
                    stack.push(child);
                }
            }
        }
        if !top_to_bottom {
            found.reverse();
        }
        found
    }

    /// Find a page below the base class by its declared external name.
    #[must_use]
    pub fn find_page_by_name(&self, name: &str) -> Option<PageClassId> {
        let base = self.base?;
        self.descendants(base, false, true)
            .into_iter()
            .find(|id| self.class(*id).name == name)
    }
}

static CAMEL_BOUNDARY: OnceLock<Regex> = OnceLock::new();
static LOWER_UPPER: OnceLock<Regex> = OnceLock::new();

/// Convert a camel-cased type name to title case: "LoginPage" becomes
/// "Login Page", "PageV2" becomes "Page V2".
#[must_use]
pub fn titleize(type_name: &str) -> String {
    let camel = CAMEL_BOUNDARY
        .get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static pattern"));
    let lower_upper =
        LOWER_UPPER.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static pattern"));
    let spaced = camel.replace_all(type_name, "$1 $2");
    lower_upper.replace_all(&spaced, "$1 $2").into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn spec(type_name: &str) -> PageClassSpec {
        PageClassSpec::new(type_name)
    }

    mod titleize_tests {
        use super::*;

        #[test]
        fn test_camel_to_title() {
            assert_eq!(titleize("LoginPage"), "Login Page");
            assert_eq!(titleize("Page"), "Page");
            assert_eq!(titleize("MyHomePage"), "My Home Page");
        }

        #[test]
        fn test_digits_and_acronyms() {
            assert_eq!(titleize("PageV2"), "Page V2");
            assert_eq!(titleize("HTTPPage"), "HTTP Page");
        }
    }

    mod walker_tests {
        use super::*;

        /// base <- mid <- leaf, with an automation parent on base.
        fn linear_graph() -> (PageGraph, PageClassId, PageClassId, PageClassId, PageClassId) {
            let mut g = PageGraph::new();
            let auto = g.register(spec("Automation").role(ClassRole::Automation));
            let base = g.register(spec("Page").role(ClassRole::Base).parent(auto));
            g.set_base(base);
            let mid = g.register(spec("SectionPage"));
            let leaf = g.register(spec("LoginPage").parent(mid));
            (g, auto, base, mid, leaf)
        }

        #[test]
        fn test_default_excludes_root_and_everything_above() {
            let (g, auto, base, mid, leaf) = linear_graph();
            let walk = g.ancestors(leaf, WalkOrder::default());
            assert_eq!(walk, vec![leaf, mid]);
            assert!(!walk.contains(&base));
            assert!(!walk.contains(&auto));
        }

        #[test]
        fn test_include_root_walks_past_the_marker() {
            let (g, auto, base, mid, leaf) = linear_graph();
            let walk = g.ancestors(
                leaf,
                WalkOrder {
                    include_root: true,
                    ..WalkOrder::default()
                },
            );
            assert_eq!(walk, vec![leaf, mid, base, auto]);
        }

        #[test]
        fn test_exclude_self() {
            let (g, _, _, mid, leaf) = linear_graph();
            let walk = g.ancestors(
                leaf,
                WalkOrder {
                    include_self: false,
                    ..WalkOrder::default()
                },
            );
            assert_eq!(walk, vec![mid]);
        }

        #[test]
        fn test_top_to_bottom_reverses() {
            let (g, _, _, mid, leaf) = linear_graph();
            let walk = g.ancestors(
                leaf,
                WalkOrder {
                    top_to_bottom: true,
                    ..WalkOrder::default()
                },
            );
            assert_eq!(walk, vec![mid, leaf]);
        }

        #[test]
        fn test_diamond_ancestor_appears_once() {
            let mut g = PageGraph::new();
            let shared = g.register(spec("SharedWidgets"));
            let left = g.register(spec("LeftRail").parent(shared));
            let right = g.register(spec("RightRail").parent(shared));
            let leaf = g.register(spec("DashboardPage").parent(left).parent(right));
            let walk = g.ancestors(leaf, WalkOrder::default());
            let shared_count = walk.iter().filter(|id| **id == shared).count();
            assert_eq!(shared_count, 1);
            assert_eq!(walk.len(), 4);
        }

        #[test]
        fn test_nested_diamond_no_duplicates() {
            // leaf -> (d, e), e -> d: the shape that could double-push d.
            let mut g = PageGraph::new();
            let d = g.register(spec("D"));
            let e = g.register(spec("E").parent(d));
            let leaf = g.register(spec("X").parent(d).parent(e));
            let walk = g.ancestors(leaf, WalkOrder::default());
            assert_eq!(walk.iter().filter(|id| **id == d).count(), 1);
            assert_eq!(walk.len(), 3);
        }

        #[test]
        fn test_singleton_hierarchy() {
            let mut g = PageGraph::new();
            let only = g.register(spec("Alone"));
            assert_eq!(g.ancestors(only, WalkOrder::default()), vec![only]);
            assert!(g
                .ancestors(
                    only,
                    WalkOrder {
                        include_self: false,
                        ..WalkOrder::default()
                    }
                )
                .is_empty());
        }

        #[test]
        fn test_descendants_and_lookup_by_name() {
            let (g, _, base, mid, leaf) = linear_graph();
            let down = g.descendants(base, false, true);
            assert_eq!(down.len(), 2);
            assert!(down.contains(&mid) && down.contains(&leaf));
            assert_eq!(g.find_page_by_name("Login Page"), Some(leaf));
            assert_eq!(g.find_page_by_name("Nope"), None);
        }

        #[test]
        fn test_default_parent_is_base() {
            let (g, _, base, mid, _) = linear_graph();
            assert_eq!(g.class(mid).parents, vec![base]);
        }
    }

    mod walker_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Random DAGs (parents always point at earlier ids, so the
            /// graph is acyclic by construction): every ancestor shows up
            /// exactly once no matter how the diamonds overlap.
            #[test]
            fn ancestors_are_unique(edges in proptest::collection::vec(
                proptest::collection::vec(0usize..12, 0..4), 1..12,
            )) {
                let mut g = PageGraph::new();
                let mut ids = Vec::new();
                for (i, parents) in edges.iter().enumerate() {
                    let mut s = PageClassSpec::new(format!("C{i}"));
                    for p in parents {
                        if *p < ids.len() {
                            s = s.parent(ids[*p]);
                        }
                    }
                    ids.push(g.register(s));
                }
                for id in &ids {
                    let walk = g.ancestors(*id, WalkOrder {
                        include_root: true,
                        ..WalkOrder::default()
                    });
                    let mut dedup = walk.clone();
                    dedup.sort_unstable();
                    dedup.dedup();
                    prop_assert_eq!(walk.len(), dedup.len());
                }
            }
        }
    }
}
