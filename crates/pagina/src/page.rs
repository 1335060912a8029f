//! Page instances and the dispatch boundary.
//!
//! A [`PageInstance`] is fully resolved at construction: options, then
//! locators, then host resources, then keyword registration — callers
//! never observe a half-built page. The [`Context`] owns the graph, the
//! per-scope resolver caches, the keyword registry, the automation
//! collaborator, the optional host, and the active-scope tracker, and
//! implements the four dispatch hooks the host runtime calls.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::browser::Browser;
use crate::cache::{Flyweight, Singleton};
use crate::context::{ActiveScope, HostRuntime};
use crate::embedded::{parse_embedded_args, PLACEHOLDER_MARKER};
use crate::hierarchy::{ClassRole, PageClassId, PageGraph, WalkOrder};
use crate::keywords::{
    FuncEntry, Invocation, KeywordRegistry, KeywordReturn, Param, INTRO_DOC_NAME,
};
use crate::locators::LocatorResolver;
use crate::options::{EnvConfig, OptionsResolver};
use crate::result::{PaginaError, PaginaResult};

/// A constructed page object with fully resolved configuration.
#[derive(Debug)]
pub struct PageInstance {
    class: PageClassId,
    name: String,
    uri: Option<String>,
    browser_name: Option<String>,
    base_url: Option<String>,
    options: Rc<OptionsResolver>,
    locators: Rc<LocatorResolver>,
}

impl PageInstance {
    /// The class this instance is bound to.
    #[must_use]
    pub fn class(&self) -> PageClassId {
        self.class
    }

    /// External name the page is exposed under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI fragment declared on the class.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The resolved `browser` option, if set anywhere in the layers.
    #[must_use]
    pub fn browser_name(&self) -> Option<&str> {
        self.browser_name.as_deref()
    }

    /// The resolved options for this page's scope.
    #[must_use]
    pub fn options(&self) -> &OptionsResolver {
        &self.options
    }

    /// The resolved locators for this page's scope.
    #[must_use]
    pub fn locators(&self) -> &LocatorResolver {
        &self.locators
    }

    /// Resolve a dotted locator key for this page.
    pub fn locator(&self, key: &str) -> PaginaResult<&str> {
        self.locators.get(key)
    }

    /// The URL a navigation to this page should open.
    ///
    /// Both the class URI and the `baseurl` option must be present;
    /// their absence is a distinct fatal error naming the page.
    pub fn resolve_url(&self) -> PaginaResult<String> {
        let uri = self.uri.as_deref().ok_or_else(|| PaginaError::MissingUri {
            page: self.name.clone(),
        })?;
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| PaginaError::MissingBaseUrl {
                page: self.name.clone(),
            })?;
        Ok(format!("{base}{uri}"))
    }
}

/// The dispatch boundary: owns shared state and serves the host hooks.
///
/// Read/write contract: caches and the registry grow during page
/// construction and are read-only during dispatch; the active scope is
/// written only when a dispatch returns a recognized page or fails.
pub struct Context {
    graph: PageGraph,
    env: EnvConfig,
    browser: Box<dyn Browser>,
    host: Option<Box<dyn HostRuntime>>,
    options_cache: Flyweight<String, OptionsResolver>,
    locators_cache: Flyweight<String, LocatorResolver>,
    resources_done: Flyweight<String, ()>,
    registry: Singleton<RefCell<KeywordRegistry>>,
    pages: BTreeMap<String, Rc<PageInstance>>,
    scope: ActiveScope,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("classes", &self.graph.len())
            .field("pages", &self.pages.len())
            .field("scope", &self.scope)
            .field("host", &self.host.is_some())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a context over the given graph and automation collaborator,
    /// capturing the live process environment.
    #[must_use]
    pub fn new(graph: PageGraph, browser: Box<dyn Browser>) -> Self {
        Self::with_env(graph, browser, EnvConfig::from_process())
    }

    /// Create a context with an explicit environment snapshot.
    #[must_use]
    pub fn with_env(graph: PageGraph, browser: Box<dyn Browser>, env: EnvConfig) -> Self {
        let base = graph
            .base()
            .map(|id| graph.class(id).name.clone())
            .unwrap_or_else(|| "Page".to_string());
        Self {
            graph,
            env,
            browser,
            host: None,
            options_cache: Flyweight::new(),
            locators_cache: Flyweight::new(),
            resources_done: Flyweight::new(),
            registry: Singleton::new(),
            pages: BTreeMap::new(),
            scope: ActiveScope::new(base),
        }
    }

    /// Attach a host runtime.
    #[must_use]
    pub fn with_host(mut self, host: Box<dyn HostRuntime>) -> Self {
        self.host = Some(host);
        self
    }

    /// Whether a host runtime is attached.
    #[must_use]
    pub fn in_host(&self) -> bool {
        self.host.is_some()
    }

    /// The class graph.
    #[must_use]
    pub fn graph(&self) -> &PageGraph {
        &self.graph
    }

    /// The automation collaborator.
    #[must_use]
    pub fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    /// The automation collaborator, mutably.
    pub fn browser_mut(&mut self) -> &mut dyn Browser {
        self.browser.as_mut()
    }

    /// The active-scope tracker.
    #[must_use]
    pub fn scope(&self) -> &ActiveScope {
        &self.scope
    }

    /// A previously constructed page, by external name.
    #[must_use]
    pub fn page_named(&self, name: &str) -> Option<Rc<PageInstance>> {
        self.pages.get(name).map(Rc::clone)
    }

    /// Construct (or return the existing) page instance for `class`.
    ///
    /// Resolution order: options, locators, host resources, keyword
    /// registration. Resolvers are shared per declaring origin; the
    /// instance itself is shared per external page name.
    pub fn page(&mut self, class: PageClassId) -> PaginaResult<Rc<PageInstance>> {
        let (name, origin, uri) = {
            let declared = self.graph.class(class);
            (
                declared.name.clone(),
                declared.origin.clone(),
                declared.uri.clone(),
            )
        };
        if let Some(existing) = self.pages.get(&name) {
            return Ok(Rc::clone(existing));
        }
        tracing::debug!(page = %name, origin = %origin, "constructing page instance");

        let graph = &self.graph;
        let env = &self.env;
        let host = self.host.as_deref();
        let options = self
            .options_cache
            .get_or_create(origin.clone(), || {
                OptionsResolver::build(graph, class, host, env)
            })?;
        let locators = self
            .locators_cache
            .get_or_create(origin.clone(), || LocatorResolver::build(graph, class))?;

        self.import_resources(class, &origin)?;

        let registry = self
            .registry
            .get_or_create(|| Ok(RefCell::new(KeywordRegistry::new())))?;
        registry
            .borrow_mut()
            .add_page_operations(&self.graph, class, &name);

        let instance = Rc::new(PageInstance {
            class,
            name: name.clone(),
            uri,
            browser_name: options.get_str("browser"),
            base_url: options.get_str("baseurl"),
            options,
            locators,
        });
        let _ = self.pages.insert(name, Rc::clone(&instance));

        // A fresh page always starts lookups from the root vocabulary.
        if self.host.is_some() {
            self.reset_scope_to_base()?;
        }
        Ok(instance)
    }

    /// Construct the page registered below the base class under the
    /// given external name.
    pub fn page_by_name(&mut self, name: &str) -> PaginaResult<Rc<PageInstance>> {
        let class = self
            .graph
            .find_page_by_name(name)
            .ok_or_else(|| PaginaError::PageNotFound {
                name: name.to_string(),
            })?;
        self.page(class)
    }

    /// Hook: the external names registered for the page.
    #[must_use]
    pub fn keyword_names(&self, page: &PageInstance) -> Vec<String> {
        self.registry
            .get()
            .map(|registry| registry.borrow().operation_names(page.name()))
            .unwrap_or_default()
    }

    /// Hook: the external names of whichever page is currently in scope.
    #[must_use]
    pub fn active_keyword_names(&self) -> Vec<String> {
        self.registry
            .get()
            .map(|registry| registry.borrow().operation_names(self.scope.current()))
            .unwrap_or_default()
    }

    /// Hook: resolve and invoke a keyword on the page.
    ///
    /// When the matched alias carries placeholders, the arguments are
    /// recovered from the invocation text itself. An operation of the
    /// automation base that returns nothing yields the receiving page,
    /// keeping fluent chains on the current page. A returned page whose
    /// name is recognized moves the active scope; a handler failure
    /// forces the scope back to base and surfaces a dispatch error with
    /// the original message.
    pub fn run_keyword(
        &mut self,
        page: &Rc<PageInstance>,
        name: &str,
        args: &[String],
        named: &BTreeMap<String, String>,
    ) -> PaginaResult<KeywordReturn> {
        let entry = self.resolve_entry(page.name(), name)?;
        let outcome = self.call_entry(&entry, page, name, args, named);
        match outcome {
            Err(original) => {
                if let Err(reset) = self.reset_scope_to_base() {
                    tracing::warn!(error = %reset, "scope reset failed after dispatch error");
                }
                Err(PaginaError::Dispatch {
                    keyword: name.to_string(),
                    page: page.name().to_string(),
                    message: original.to_string(),
                })
            }
            Ok(ret) => {
                let ret = match ret {
                    KeywordReturn::None
                        if self.graph.class(entry.class).role == ClassRole::Automation =>
                    {
                        KeywordReturn::Page(Rc::clone(page))
                    }
                    other => other,
                };
                if let KeywordReturn::Page(returned) = &ret {
                    let returned = Rc::clone(returned);
                    self.adopt_scope(&returned)?;
                }
                Ok(ret)
            }
        }
    }

    /// Hook: documentation for a keyword, or the synthesized class-level
    /// description for the reserved introspection name.
    pub fn keyword_documentation(&self, page: &PageInstance, name: &str) -> PaginaResult<String> {
        if name == INTRO_DOC_NAME {
            let doc = &self.graph.class(page.class()).doc;
            let note =
                "All keywords of the wrapped automation vocabulary are provided by the base Page class.";
            return Ok(if doc.is_empty() {
                note.to_string()
            } else {
                format!("{doc}\n\n{note}")
            });
        }
        Ok(self.resolve_entry(page.name(), name)?.doc)
    }

    /// Hook: rendered argument descriptors for a keyword, omitting any
    /// parameter consumed by embedded-argument templating.
    pub fn keyword_arguments(&self, page: &PageInstance, name: &str) -> PaginaResult<Vec<String>> {
        let entry = self.resolve_entry(page.name(), name)?;
        Ok(entry
            .params
            .iter()
            .filter(|param| !entry.alias.contains(&format!("${{{}}}", param.name)))
            .map(Param::render)
            .collect())
    }

    fn call_entry(
        &mut self,
        entry: &FuncEntry,
        page: &Rc<PageInstance>,
        name: &str,
        args: &[String],
        named: &BTreeMap<String, String>,
    ) -> PaginaResult<KeywordReturn> {
        let embedded;
        let args = if entry.alias.contains(PLACEHOLDER_MARKER) {
            embedded = parse_embedded_args(name, &entry.alias)?;
            &embedded[..]
        } else {
            args
        };
        let mut invocation = Invocation {
            context: self,
            page: Rc::clone(page),
            args,
            named,
        };
        (entry.handler)(&mut invocation)
    }

    fn resolve_entry(&self, page_name: &str, external: &str) -> PaginaResult<FuncEntry> {
        let registry = self
            .registry
            .get()
            .ok_or_else(|| PaginaError::KeywordNotFound {
                name: external.to_string(),
            })?;
        let resolved = registry.borrow().resolve(page_name, external);
        resolved
    }

    /// Move the active scope to a page a dispatch returned, when its
    /// identity is recognized; leave the scope alone otherwise.
    fn adopt_scope(&mut self, page: &PageInstance) -> PaginaResult<()> {
        if self.host.is_some() {
            let type_name = &self.graph.class(page.class()).type_name;
            let matched = self
                .host
                .as_deref()
                .map(|host| host.libraries())
                .unwrap_or_default()
                .into_iter()
                .find(|library| library.rsplit('.').next() == Some(type_name.as_str()));
            if let Some(library) = matched {
                if let Some(host) = self.host.as_deref_mut() {
                    host.set_search_order(&library)?;
                }
                self.scope.set(library);
            }
        } else {
            let known = self
                .registry
                .get()
                .is_some_and(|registry| registry.borrow().is_registered(page.name()));
            if known {
                self.scope.set(page.name());
            }
        }
        Ok(())
    }

    fn reset_scope_to_base(&mut self) -> PaginaResult<()> {
        let base = self.scope.base().to_string();
        if let Some(host) = self.host.as_deref_mut() {
            host.set_search_order(&base)?;
        }
        self.scope.reset_to_base();
        Ok(())
    }

    /// Import each existing per-class resource file into the host,
    /// root to leaf; runs once per declaring origin.
    fn import_resources(&mut self, class: PageClassId, origin: &str) -> PaginaResult<()> {
        if self.host.is_none() {
            tracing::debug!("no host attached; skipping resource import");
            return Ok(());
        }
        if self.resources_done.contains(&origin.to_string()) {
            return Ok(());
        }
        let order = WalkOrder {
            top_to_bottom: true,
            ..WalkOrder::default()
        };
        let mut paths = Vec::new();
        for ancestor in self.graph.ancestors(class, order) {
            if let Some(path) = self.graph.class(ancestor).resource_path() {
                if path.is_file() {
                    paths.push(path);
                }
            }
        }
        if let Some(host) = self.host.as_deref_mut() {
            for path in &paths {
                tracing::debug!(path = %path.display(), "importing host resource");
                host.import_resource(path)?;
            }
        }
        let _ = self
            .resources_done
            .get_or_create(origin.to_string(), || Ok(()))?;
        Ok(())
    }
}
