//! The standard root of every page graph.
//!
//! Three classes sit above user pages: the automation base carrying the
//! wrapped action vocabulary, the logging capability (present in the
//! hierarchy, never registered as keywords), and the base `Page` class
//! with the keywords every page shares. User classes registered with no
//! explicit parent inherit the base page automatically.

use std::rc::Rc;

use crate::hierarchy::{ClassRole, PageClassSpec, PageGraph};
use crate::keywords::{Invocation, KeywordReturn, OperationDescriptor};
use crate::page::{Context, PageInstance};
use crate::resolver::OptionValue;
use crate::result::{PaginaError, PaginaResult};

/// Seconds a page-load verification waits for the master locator.
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;

/// Build a graph seeded with the automation, logging, and base classes.
#[must_use]
pub fn standard_graph() -> PageGraph {
    let mut graph = PageGraph::new();
    let automation = graph.register(
        PageClassSpec::new("AutomationBase")
            .role(ClassRole::Automation)
            .doc("Wrapped automation action vocabulary.")
            .operation(
                OperationDescriptor::new("open_browser", kw_open_browser)
                    .doc("Open a browser session at the given URL.")
                    .param("url")
                    .param_with_default("browser", "firefox"),
            )
            .operation(
                OperationDescriptor::new("go_to", kw_go_to_url)
                    .doc("Navigate the session to the given URL.")
                    .param("url"),
            )
            .operation(
                OperationDescriptor::new("click_element", kw_click_element)
                    .doc("Click the element identified by the locator.")
                    .param("locator"),
            )
            .operation(
                OperationDescriptor::new("input_text", kw_input_text)
                    .doc("Type the text into the element identified by the locator.")
                    .param("locator")
                    .param("text"),
            )
            .operation(
                OperationDescriptor::new("wait_until_element_is_visible", kw_wait_until_visible)
                    .doc("Wait until the element at the locator is visible.")
                    .param("locator")
                    .param_with_default("timeout", "5"),
            )
            .operation(
                OperationDescriptor::new("select_window", kw_select_window)
                    .doc("Select the window with the given title, name, or URL.")
                    .param("name"),
            )
            .operation(
                OperationDescriptor::new("maximize_browser_window", kw_maximize_window)
                    .doc("Maximize the session's window."),
            )
            .operation(
                OperationDescriptor::new("get_location", kw_get_location)
                    .doc("Return the URL of the root document."),
            ),
    );
    let logging = graph.register(
        PageClassSpec::new("Logger")
            .role(ClassRole::Logging)
            .doc("Logging capability; its operations never become keywords.")
            .operation(
                OperationDescriptor::new("log", kw_log)
                    .doc("Emit a message to the execution log.")
                    .param("message")
                    .param_with_default("level", "INFO"),
            ),
    );
    let base = graph.register(
        PageClassSpec::new("Page")
            .role(ClassRole::Base)
            .parent(automation)
            .parent(logging)
            .doc("Base page object; every page inherits its keywords.")
            .operation(
                OperationDescriptor::new("open", kw_open)
                    .alias("Open ${pagename}")
                    .doc(
                        "Open a browser on the named page, resolving its URL \
                         from the baseurl option and the page's URI, and verify \
                         the page loaded.",
                    )
                    .param("pagename"),
            )
            .operation(
                OperationDescriptor::new("go_to_page", kw_go_to_page)
                    .alias("Go To ${pagename}")
                    .doc(
                        "Navigate the existing browser session to the named \
                         page and verify it loaded.",
                    )
                    .param("pagename"),
            )
            .operation(
                OperationDescriptor::new("current_page_should_be", kw_current_page_should_be)
                    .doc(
                        "Verify that the browser sits on this page: the master \
                         locator is visible and the location contains the \
                         page's URI.",
                    )
                    .param_with_default("timeout", "30"),
            )
            .operation(
                OperationDescriptor::new("wait_for_ready_state", kw_wait_for_ready_state)
                    .doc("Verify the document ready state; waiting is delegated to the automation layer.")
                    .param_with_default("state", "complete")
                    .param_with_default("timeout", "30"),
            )
            .operation(
                OperationDescriptor::new("get_locator", kw_get_locator)
                    .doc("Return the locator registered under the given key.")
                    .param("key"),
            )
            .operation(
                OperationDescriptor::new("select_window_when_visible", kw_select_window_when_visible)
                    .doc("Select the named window once it is available.")
                    .param("win_name")
                    .param_with_default("timeout", "30"),
            )
            .operation(
                OperationDescriptor::new("get_current_browser", kw_get_current_browser)
                    .doc("Report whether a browser session is active."),
            ),
    );
    graph.set_base(base);
    graph
}

/// Wait for the page's master locator and check the location contains
/// the page URI; shared by the open, go-to, and verification keywords.
fn verify_current_page(
    context: &mut Context,
    page: &PageInstance,
    timeout_secs: u64,
) -> PaginaResult<()> {
    let master = page.locator("master")?.to_string();
    context
        .browser_mut()
        .wait_until_visible(&master, timeout_secs)
        .map_err(|e| PaginaError::Browser {
            message: format!("page load: {e}"),
        })?;
    let uri = page.uri().ok_or_else(|| PaginaError::MissingUri {
        page: page.name().to_string(),
    })?;
    let location = context.browser_mut().current_url()?;
    if !location.to_lowercase().contains(&uri.to_lowercase()) {
        return Err(PaginaError::Browser {
            message: format!(
                "expected page uri to contain '{uri}' but it did not: {location}"
            ),
        });
    }
    Ok(())
}

fn open_target(inv: &mut Invocation<'_>, pagename: &str) -> PaginaResult<(Rc<PageInstance>, String)> {
    let target = inv.context.page_by_name(pagename)?;
    let url = target.resolve_url()?;
    Ok((target, url))
}

fn kw_open(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let pagename = inv.arg(0, "pagename")?.to_string();
    tracing::debug!(page = %pagename, "opening browser");
    let (target, url) = open_target(inv, &pagename)?;
    let browser_name = inv
        .page
        .browser_name()
        .or(target.browser_name())
        .map(str::to_string)
        .ok_or_else(|| PaginaError::MissingBrowserOption {
            page: target.name().to_string(),
        })?;
    inv.context.browser_mut().open(&url, &browser_name)?;
    inv.context.browser_mut().maximize_window()?;
    verify_current_page(inv.context, &target, DEFAULT_LOAD_TIMEOUT_SECS)?;
    Ok(KeywordReturn::Page(target))
}

fn kw_go_to_page(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let pagename = inv.arg(0, "pagename")?.to_string();
    tracing::debug!(page = %pagename, "navigating");
    if !inv.context.browser().is_open() {
        return Err(PaginaError::Browser {
            message: format!("no browser found; use 'Open {pagename}' instead"),
        });
    }
    let (target, url) = open_target(inv, &pagename)?;
    inv.context.browser_mut().navigate(&url)?;
    inv.context.browser_mut().maximize_window()?;
    verify_current_page(inv.context, &target, DEFAULT_LOAD_TIMEOUT_SECS)?;
    Ok(KeywordReturn::Page(target))
}

fn kw_current_page_should_be(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let timeout = inv.arg_secs_or(0, DEFAULT_LOAD_TIMEOUT_SECS);
    let page = Rc::clone(&inv.page);
    verify_current_page(inv.context, &page, timeout)?;
    Ok(KeywordReturn::Page(page))
}

fn kw_wait_for_ready_state(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let state = inv.arg_or(0, "complete").to_string();
    let actual = inv.context.browser_mut().ready_state()?;
    if actual != state {
        return Err(PaginaError::Browser {
            message: format!("document ready state is '{actual}', expected '{state}'"),
        });
    }
    Ok(KeywordReturn::Page(Rc::clone(&inv.page)))
}

fn kw_get_locator(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let key = inv.arg(0, "key")?;
    let value = inv.page.locator(key)?.to_string();
    Ok(KeywordReturn::Value(OptionValue::String(value)))
}

fn kw_select_window_when_visible(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let name = inv.arg(0, "win_name")?.to_string();
    inv.context.browser_mut().select_window(&name)?;
    Ok(KeywordReturn::Page(Rc::clone(&inv.page)))
}

fn kw_get_current_browser(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    Ok(KeywordReturn::Value(OptionValue::Bool(
        inv.context.browser().is_open(),
    )))
}

fn kw_open_browser(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let url = inv.arg(0, "url")?.to_string();
    let browser = inv.arg_or(1, "firefox").to_string();
    inv.context.browser_mut().open(&url, &browser)?;
    Ok(KeywordReturn::None)
}

fn kw_go_to_url(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let url = inv.arg(0, "url")?.to_string();
    inv.context.browser_mut().navigate(&url)?;
    Ok(KeywordReturn::None)
}

fn kw_click_element(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let locator = inv.arg(0, "locator")?.to_string();
    inv.context.browser_mut().click(&locator)?;
    Ok(KeywordReturn::None)
}

fn kw_input_text(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let locator = inv.arg(0, "locator")?.to_string();
    let text = inv.arg(1, "text")?.to_string();
    inv.context.browser_mut().input_text(&locator, &text)?;
    Ok(KeywordReturn::None)
}

fn kw_wait_until_visible(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let locator = inv.arg(0, "locator")?.to_string();
    let timeout = inv.arg_secs_or(1, 5);
    inv.context.browser_mut().wait_until_visible(&locator, timeout)?;
    Ok(KeywordReturn::None)
}

fn kw_select_window(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let name = inv.arg(0, "name")?.to_string();
    inv.context.browser_mut().select_window(&name)?;
    Ok(KeywordReturn::None)
}

fn kw_maximize_window(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    inv.context.browser_mut().maximize_window()?;
    Ok(KeywordReturn::None)
}

fn kw_get_location(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let url = inv.context.browser_mut().current_url()?;
    Ok(KeywordReturn::Value(OptionValue::String(url)))
}

fn kw_log(inv: &mut Invocation<'_>) -> PaginaResult<KeywordReturn> {
    let message = inv.arg(0, "message")?;
    match inv.arg_or(1, "INFO") {
        "WARN" => tracing::warn!("{message}"),
        "DEBUG" => tracing::debug!("{message}"),
        _ => tracing::info!("{message}"),
    }
    Ok(KeywordReturn::None)
}
