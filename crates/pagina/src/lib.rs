//! Pagina: hierarchical page-object keyword library for external test
//! runners.
//!
//! Test authors describe pages as classes in an inheritance graph; each
//! class contributes operations, locators, and options. Pagina flattens
//! every page's hierarchy into an aliasable set of externally callable
//! keywords, and resolves configuration and element locators through the
//! same hierarchy with deterministic override precedence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     host test runner                          │
//! │   keyword_names / run_keyword / documentation / arguments     │
//! └──────────────────────────┬───────────────────────────────────┘
//!                            │
//!                    ┌───────▼────────┐      ┌─────────────────┐
//!                    │    Context     │─────►│ KeywordRegistry │
//!                    │ (dispatch,     │      └─────────────────┘
//!                    │  active scope) │      ┌─────────────────┐
//!                    │                │─────►│ Options/Locator │
//!                    └───────┬────────┘      │    resolvers    │
//!                            │               └─────────────────┘
//!                    ┌───────▼────────┐      ┌─────────────────┐
//!                    │   PageGraph    │      │ Browser (trait) │
//!                    └────────────────┘      └─────────────────┘
//! ```
//!
//! Everything runs single-threaded and synchronous: one keyword call
//! completes before the next begins, which is what makes the shared
//! caches and the active-scope tracker safe without locks.

#![warn(missing_docs)]

/// The automation collaborator boundary and a recording stub.
pub mod browser;

/// The standard graph root: automation, logging, and base page classes.
pub mod builtin;

/// Scope-keyed and single-instance caches for resolver objects.
pub mod cache;

/// Host-runtime boundary and the active-page scope tracker.
pub mod context;

/// Embedded-argument parsing for templated keyword aliases.
pub mod embedded;

/// Page-class hierarchy graph and traversal.
pub mod hierarchy;

/// Keyword discovery and the external-name registry.
pub mod keywords;

/// Element locators resolved through per-class YAML sources.
pub mod locators;

/// Layered configuration options resolved through the page hierarchy.
pub mod options;

/// Page instances and the dispatch boundary.
pub mod page;

/// Generic layered-merge engine behind the two resolvers.
pub mod resolver;

/// Result and error types.
pub mod result;

pub use browser::{Browser, NoopBrowser};
pub use builtin::standard_graph;
pub use cache::{Flyweight, Singleton};
pub use context::{ActiveScope, HostRuntime};
pub use embedded::parse_embedded_args;
pub use hierarchy::{ClassRole, PageClassId, PageClassSpec, PageGraph, WalkOrder};
pub use keywords::{
    Invocation, KeywordRegistry, KeywordReturn, OperationDescriptor, Param, ParamKind,
};
pub use locators::LocatorResolver;
pub use options::{EnvConfig, OptionsResolver};
pub use page::{Context, PageInstance};
pub use resolver::{Layer, LocatorNode, OptionValue};
pub use result::{PaginaError, PaginaResult};
