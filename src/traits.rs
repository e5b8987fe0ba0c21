use std::fmt;

use async_trait::async_trait;

use crate::error::ScraperError;

/// Clicks the element from inside the page, bypassing overlay interception.
pub const CLICK_JS: &str = "function() { this.click(); }";

/// Element locator. Child lookups only accept CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(&'static str),
    XPath(&'static str),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// A controllable browser session.
///
/// Every pipeline stage drives the browser through this trait, so the
/// extraction logic does not care whether it talks to Chrome or to an
/// in-memory page.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    /// Load a URL in the session's page
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// First element in the document matching the selector
    async fn find_element(&self, selector: &Selector) -> Result<Self::Element, ScraperError>;

    /// All elements in the document matching the selector
    async fn find_elements(&self, selector: &Selector)
        -> Result<Vec<Self::Element>, ScraperError>;

    /// First descendant of `parent` matching the selector
    async fn find_child(
        &self,
        parent: &Self::Element,
        selector: &Selector,
    ) -> Result<Self::Element, ScraperError>;

    /// Rendered text of the element
    async fn text(&self, element: &Self::Element) -> Result<Option<String>, ScraperError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    /// Native click (scrolls into view, dispatches mouse events)
    async fn click(&self, element: &Self::Element) -> Result<(), ScraperError>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<(), ScraperError>;

    async fn press_key(&self, element: &Self::Element, key: &str) -> Result<(), ScraperError>;

    /// Run a JS function declaration with `this` bound to the element
    async fn call_on_element(
        &self,
        element: &Self::Element,
        function: &str,
    ) -> Result<serde_json::Value, ScraperError>;

    /// Script-driven click
    async fn script_click(&self, element: &Self::Element) -> Result<(), ScraperError> {
        self.call_on_element(element, CLICK_JS).await.map(|_| ())
    }

    /// Terminate the session
    async fn quit(&mut self) -> Result<(), ScraperError>;
}
