//! Host-runtime boundary and the active-page scope tracker.
//!
//! The host test runner owns a live variable table and the search order
//! used to pick which library answers a keyword name first. Pagina only
//! talks to it through [`HostRuntime`]; running without a host is the
//! normal standalone mode and every consumer of the trait treats the
//! host as optional.

use std::collections::BTreeMap;
use std::path::Path;

use crate::resolver::OptionValue;
use crate::result::PaginaResult;

/// Interface to the external automation-driving host.
pub trait HostRuntime {
    /// The host's live variable table, keys in the host's own notation.
    fn variables(&self) -> BTreeMap<String, OptionValue>;

    /// Identifiers of the libraries currently imported into the host.
    fn libraries(&self) -> Vec<String>;

    /// Move the named library to the front of keyword lookup.
    fn set_search_order(&mut self, name: &str) -> PaginaResult<()>;

    /// Import a resource file into the host's namespace.
    fn import_resource(&mut self, path: &Path) -> PaginaResult<()>;
}

/// Tracker for which page's operations are in scope for keyword lookup.
///
/// Two states: scoped to a specific page, or scoped to the base page.
/// Writes happen at exactly two points — after a successful dispatch
/// that returned a recognized page, and on dispatch failure (forced back
/// to base so later lookups land on the root vocabulary).
#[derive(Debug, Clone)]
pub struct ActiveScope {
    base: String,
    current: Option<String>,
}

impl ActiveScope {
    /// Create a tracker scoped to the given base identifier.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            current: None,
        }
    }

    /// The identifier lookups should consult first.
    #[must_use]
    pub fn current(&self) -> &str {
        self.current.as_deref().unwrap_or(&self.base)
    }

    /// Whether the tracker sits at the base scope.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.current.is_none()
    }

    /// Scope to the given page identifier.
    pub fn set(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(scope = %name, "active page changed");
        self.current = Some(name);
    }

    /// Force the scope back to the base identifier.
    pub fn reset_to_base(&mut self) {
        if self.current.is_some() {
            tracing::debug!(base = %self.base, "active page reset to base");
        }
        self.current = None;
    }

    /// The base identifier this tracker falls back to.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }
}
