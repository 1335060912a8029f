//! Result and error types for Pagina.

use thiserror::Error;

/// Result type for Pagina operations
pub type PaginaResult<T> = Result<T, PaginaError>;

/// Errors that can occur in Pagina
#[derive(Debug, Error)]
pub enum PaginaError {
    /// Keyword name could not be resolved against any registered page
    #[error("No keyword found with name '{name}' in pages")]
    KeywordNotFound {
        /// The external keyword name that was requested
        name: String,
    },

    /// Locator key missing from the merged locator table
    #[error("No locator found with key '{key}' for page '{page}'")]
    LocatorNotFound {
        /// Normalized dotted locator key
        key: String,
        /// External name of the page that was queried
        page: String,
    },

    /// Locator source file could not be read or parsed
    #[error("Couldn't read locator source '{path}': {message}")]
    LocatorSource {
        /// Path of the offending locator file
        path: String,
        /// Underlying cause
        message: String,
    },

    /// External variable file missing or unparseable (fatal at startup)
    #[error("Couldn't import variable file: {path}. Ensure it exists and is parseable: {message}")]
    VarFileImport {
        /// Path named by the variable-file environment setting
        path: String,
        /// Underlying cause
        message: String,
    },

    /// Page class has no URI fragment declared
    #[error("Page object \"{page}\" must have a \"uri\" attribute set")]
    MissingUri {
        /// External name of the page
        page: String,
    },

    /// Base URL option absent when a navigation needed it
    #[error("To open page object \"{page}\" you must set a baseurl")]
    MissingBaseUrl {
        /// External name of the page
        page: String,
    },

    /// Browser option absent when a navigation needed it
    #[error("To open page object \"{page}\" you must set a browser option")]
    MissingBrowserOption {
        /// External name of the page
        page: String,
    },

    /// No page registered under the requested external name
    #[error("No page object found with name '{name}'")]
    PageNotFound {
        /// The external page name that was requested
        name: String,
    },

    /// Embedded-argument parsing matched a placeholder to no input tokens
    #[error("No argument found for placeholder '{placeholder}' in keyword alias '{alias}'")]
    NoArgumentFound {
        /// The placeholder token that stayed empty
        placeholder: String,
        /// The alias template being parsed
        alias: String,
    },

    /// A required positional argument was not supplied
    #[error("Missing required argument '{name}'")]
    MissingArgument {
        /// Declared parameter name
        name: String,
    },

    /// Underlying keyword callable failed; original message preserved
    #[error("Keyword '{keyword}' failed on page '{page}': {message}")]
    Dispatch {
        /// External keyword name that was invoked
        keyword: String,
        /// External name of the receiving page
        page: String,
        /// Message of the original failure
        message: String,
    },

    /// Automation collaborator reported a failure
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
