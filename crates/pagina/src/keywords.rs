//! Keyword discovery and the external-name registry.
//!
//! Classes declare their operations up front as [`OperationDescriptor`]s;
//! discovery walks a page's hierarchy root to leaf and flattens the
//! eligible operations into two maps per page — alias to callable and
//! resolved external name to alias — plus one process-wide table of
//! external names. Discovery runs at most once per distinct external
//! page name, so re-registering a page is free and changes nothing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::hierarchy::{ClassRole, PageClassId, PageGraph, WalkOrder};
use crate::page::{Context, PageInstance};
use crate::resolver::OptionValue;
use crate::result::{PaginaError, PaginaResult};

/// The four dispatch-hook names the registry never exposes as keywords.
pub const RESERVED_HOOKS: [&str; 4] = [
    "get_keyword_names",
    "run_keyword",
    "get_keyword_arguments",
    "get_keyword_documentation",
];

/// Placeholder substituted with the page's external name in aliases.
pub const PAGENAME_PLACEHOLDER: &str = "${pagename}";

/// Reserved introspection name answered by the documentation hook with a
/// class-level description.
pub const INTRO_DOC_NAME: &str = "__intro__";

/// How a declared parameter binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Ordinary positional parameter, optionally defaulted
    Positional,
    /// Catch-all for extra positional arguments
    VarArgs,
    /// Catch-all for extra named arguments
    KwArgs,
}

/// One declared parameter of an operation, receiver excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Rendered default value, when the parameter is optional
    pub default: Option<String>,
    /// Binding kind
    pub kind: ParamKind,
}

impl Param {
    /// Render the parameter the way argument-spec consumers expect:
    /// `name`, `name=default`, `*name`, or `**name`.
    #[must_use]
    pub fn render(&self) -> String {
        match self.kind {
            ParamKind::Positional => match &self.default {
                Some(default) => format!("{}={default}", self.name),
                None => self.name.clone(),
            },
            ParamKind::VarArgs => format!("*{}", self.name),
            ParamKind::KwArgs => format!("**{}", self.name),
        }
    }
}

/// Signature of a keyword handler.
pub type KeywordFn = fn(&mut Invocation<'_>) -> PaginaResult<KeywordReturn>;

/// What a keyword handler produced.
#[derive(Debug, Clone)]
pub enum KeywordReturn {
    /// Nothing of note
    None,
    /// A plain value handed back to the host
    Value(OptionValue),
    /// A page object; may move the active scope
    Page(Rc<PageInstance>),
}

/// One in-flight keyword call: the dispatch boundary hands the handler
/// the context, the receiving page, and the (possibly embedded-parsed)
/// arguments.
pub struct Invocation<'a> {
    /// The dispatch boundary owning caches, registry, browser, and host
    pub context: &'a mut Context,
    /// The page the keyword was invoked on
    pub page: Rc<PageInstance>,
    /// Positional arguments
    pub args: &'a [String],
    /// Named arguments
    pub named: &'a BTreeMap<String, String>,
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("page", &self.page.name())
            .field("args", &self.args)
            .field("named", &self.named)
            .finish_non_exhaustive()
    }
}

impl<'a> Invocation<'a> {
    /// Fetch a required positional argument.
    pub fn arg(&self, index: usize, name: &str) -> PaginaResult<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| PaginaError::MissingArgument {
                name: name.to_string(),
            })
    }

    /// Fetch an optional positional argument.
    #[must_use]
    pub fn arg_or(&self, index: usize, default: &'a str) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or(default)
    }

    /// Fetch an optional positional argument as whole seconds.
    #[must_use]
    pub fn arg_secs_or(&self, index: usize, default: u64) -> u64 {
        self.args
            .get(index)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }
}

/// A callable operation declared by a page class.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Canonical definition name
    pub name: String,
    /// Alias template; the canonical name when absent
    pub alias: Option<String>,
    /// Documentation surfaced by the documentation hook
    pub doc: String,
    /// Declared parameters, receiver excluded
    pub params: Vec<Param>,
    /// The handler invoked on dispatch
    pub handler: KeywordFn,
}

impl OperationDescriptor {
    /// Describe an operation with the given canonical name and handler.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: KeywordFn) -> Self {
        Self {
            name: name.into(),
            alias: None,
            doc: String::new(),
            params: Vec::new(),
            handler,
        }
    }

    /// Give the operation an alias template.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Declare a required positional parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
            kind: ParamKind::Positional,
        });
        self
    }

    /// Declare a defaulted positional parameter.
    #[must_use]
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
            kind: ParamKind::Positional,
        });
        self
    }

    /// Declare a variadic positional catch-all.
    #[must_use]
    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
            kind: ParamKind::VarArgs,
        });
        self
    }

    /// Declare a variadic named catch-all.
    #[must_use]
    pub fn kwargs(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
            kind: ParamKind::KwArgs,
        });
        self
    }
}

/// Resolved callable record: alias to definition, keyed per page.
#[derive(Debug, Clone)]
pub struct FuncEntry {
    /// Alias template the operation registered under
    pub alias: String,
    /// Canonical definition name
    pub def_name: String,
    /// Class the operation was discovered on
    pub class: PageClassId,
    /// Documentation string
    pub doc: String,
    /// Declared parameters
    pub params: Vec<Param>,
    /// The handler
    pub handler: KeywordFn,
}

/// External-name record: resolved name back to its page and alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    /// Fully resolved external name
    pub external_name: String,
    /// External name of the owning page
    pub page_name: String,
    /// Alias key into the page's [`FuncEntry`] map
    pub alias: String,
}

/// Discovers and indexes the callable operations of page hierarchies.
#[derive(Debug, Default)]
pub struct KeywordRegistry {
    func_by_page: HashMap<String, BTreeMap<String, FuncEntry>>,
    host_by_page: HashMap<String, BTreeMap<String, HostEntry>>,
    host_by_name: HashMap<String, HostEntry>,
}

impl KeywordRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover and register all eligible operations for the page.
    ///
    /// Walks root to leaf (root marker included) and flattens each
    /// class's declared operations, skipping: logging-capability
    /// classes; automation-base classes unless the page's own class is
    /// the base page type; names starting with `_`; and the four
    /// reserved dispatch hooks. Later (more leafward) classes overwrite
    /// earlier ones at the same alias. Idempotent per external page
    /// name.
    pub fn add_page_operations(&mut self, graph: &PageGraph, class: PageClassId, page_name: &str) {
        if self.host_by_page.contains_key(page_name) {
            return;
        }
        let is_base = graph.class(class).role == ClassRole::Base;
        let order = WalkOrder {
            include_self: true,
            top_to_bottom: true,
            include_root: true,
        };
        let mut func_map = BTreeMap::new();
        let mut host_map: BTreeMap<String, HostEntry> = BTreeMap::new();
        for visited in graph.ancestors(class, order) {
            let declared = graph.class(visited);
            match declared.role {
                ClassRole::Logging => continue,
                ClassRole::Automation if !is_base => continue,
                _ => {}
            }
            for op in &declared.operations {
                if op.name.starts_with('_') || RESERVED_HOOKS.contains(&op.name.as_str()) {
                    continue;
                }
                let alias = op.alias.clone().unwrap_or_else(|| op.name.clone());
                let external = alias.replace(PAGENAME_PLACEHOLDER, page_name);
                let _ = func_map.insert(
                    alias.clone(),
                    FuncEntry {
                        alias: alias.clone(),
                        def_name: op.name.clone(),
                        class: visited,
                        doc: op.doc.clone(),
                        params: op.params.clone(),
                        handler: op.handler,
                    },
                );
                let _ = host_map.insert(
                    external.clone(),
                    HostEntry {
                        external_name: external,
                        page_name: page_name.to_string(),
                        alias,
                    },
                );
            }
        }
        tracing::debug!(page = %page_name, keywords = host_map.len(), "registered page operations");
        for (name, entry) in &host_map {
            let _ = self.host_by_name.insert(name.clone(), entry.clone());
        }
        let _ = self.func_by_page.insert(page_name.to_string(), func_map);
        let _ = self.host_by_page.insert(page_name.to_string(), host_map);
    }

    /// The external names registered for the page, in stable order.
    /// Unknown pages yield an empty list.
    #[must_use]
    pub fn operation_names(&self, page_name: &str) -> Vec<String> {
        self.host_by_page
            .get(page_name)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Resolve an external keyword name against the page's operations.
    pub fn resolve(&self, page_name: &str, external_name: &str) -> PaginaResult<FuncEntry> {
        let not_found = || PaginaError::KeywordNotFound {
            name: external_name.to_string(),
        };
        let host_entry = self.host_by_name.get(external_name).ok_or_else(not_found)?;
        self.func_by_page
            .get(page_name)
            .and_then(|aliases| aliases.get(&host_entry.alias))
            .cloned()
            .ok_or_else(not_found)
    }

    /// Whether discovery already ran for the page name.
    #[must_use]
    pub fn is_registered(&self, page_name: &str) -> bool {
        self.host_by_page.contains_key(page_name)
    }
}
