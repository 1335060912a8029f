//! Automation collaborator boundary.
//!
//! Everything that actually touches a browser lives behind [`Browser`];
//! this crate treats "perform an action" as an opaque capability and
//! layers no waiting or retry logic on top of it. [`NoopBrowser`] records
//! the calls it receives and is good enough for dry runs and tests.

use crate::result::{PaginaError, PaginaResult};

/// The action vocabulary the base page wraps.
///
/// Implementations own all protocol handling, waiting, and retries.
pub trait Browser {
    /// Open a new browser session of the named kind at `url`.
    fn open(&mut self, url: &str, browser_name: &str) -> PaginaResult<()>;

    /// Navigate the existing session to `url`.
    fn navigate(&mut self, url: &str) -> PaginaResult<()>;

    /// Whether a session is currently open.
    fn is_open(&self) -> bool;

    /// URL of the root document, regardless of selected frame.
    fn current_url(&mut self) -> PaginaResult<String>;

    /// Maximize the session's window.
    fn maximize_window(&mut self) -> PaginaResult<()>;

    /// The document's ready state (e.g. "complete").
    fn ready_state(&mut self) -> PaginaResult<String>;

    /// Block until the element at `locator` is visible, up to `timeout`
    /// seconds.
    fn wait_until_visible(&mut self, locator: &str, timeout_secs: u64) -> PaginaResult<()>;

    /// Select the window with the given title, name, or URL.
    fn select_window(&mut self, name: &str) -> PaginaResult<()>;

    /// Click the element at `locator`.
    fn click(&mut self, locator: &str) -> PaginaResult<()>;

    /// Type `text` into the element at `locator`.
    fn input_text(&mut self, locator: &str, text: &str) -> PaginaResult<()>;
}

/// A [`Browser`] that records every call and succeeds at everything a
/// real session could do, without touching any protocol.
#[derive(Debug, Default)]
pub struct NoopBrowser {
    calls: Vec<String>,
    url: Option<String>,
}

impl NoopBrowser {
    /// Create a browser with no open session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order, rendered as short strings.
    #[must_use]
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    fn session(&self) -> PaginaResult<()> {
        if self.url.is_some() {
            Ok(())
        } else {
            Err(PaginaError::Browser {
                message: "no browser session is open".to_string(),
            })
        }
    }
}

impl Browser for NoopBrowser {
    fn open(&mut self, url: &str, browser_name: &str) -> PaginaResult<()> {
        self.calls.push(format!("open {browser_name} {url}"));
        self.url = Some(url.to_string());
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> PaginaResult<()> {
        self.session()?;
        self.calls.push(format!("navigate {url}"));
        self.url = Some(url.to_string());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.url.is_some()
    }

    fn current_url(&mut self) -> PaginaResult<String> {
        self.session()?;
        self.calls.push("current_url".to_string());
        Ok(self.url.clone().unwrap_or_default())
    }

    fn maximize_window(&mut self) -> PaginaResult<()> {
        self.session()?;
        self.calls.push("maximize_window".to_string());
        Ok(())
    }

    fn ready_state(&mut self) -> PaginaResult<String> {
        self.session()?;
        self.calls.push("ready_state".to_string());
        Ok("complete".to_string())
    }

    fn wait_until_visible(&mut self, locator: &str, timeout_secs: u64) -> PaginaResult<()> {
        self.session()?;
        self.calls
            .push(format!("wait_until_visible {locator} {timeout_secs}"));
        Ok(())
    }

    fn select_window(&mut self, name: &str) -> PaginaResult<()> {
        self.session()?;
        self.calls.push(format!("select_window {name}"));
        Ok(())
    }

    fn click(&mut self, locator: &str) -> PaginaResult<()> {
        self.session()?;
        self.calls.push(format!("click {locator}"));
        Ok(())
    }

    fn input_text(&mut self, locator: &str, text: &str) -> PaginaResult<()> {
        self.session()?;
        self.calls.push(format!("input_text {locator} {text}"));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod noop_browser_tests {
        use super::*;

        #[test]
        fn test_records_calls_in_order() {
            let mut browser = NoopBrowser::new();
            browser.open("https://example.test/login", "firefox").unwrap();
            browser.click("css=#go").unwrap();
            assert_eq!(
                browser.calls(),
                &[
                    "open firefox https://example.test/login".to_string(),
                    "click css=#go".to_string(),
                ]
            );
        }

        #[test]
        fn test_actions_require_a_session() {
            let mut browser = NoopBrowser::new();
            assert!(!browser.is_open());
            assert!(browser.navigate("https://example.test").is_err());
            assert!(browser.current_url().is_err());
            browser.open("https://example.test", "firefox").unwrap();
            assert!(browser.is_open());
            assert_eq!(browser.current_url().unwrap(), "https://example.test");
        }
    }
}
