//! In-memory `BrowserSession` for exercising the stage logic in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScraperError;
use crate::traits::{BrowserSession, Selector, CLICK_JS};

use super::scroll::{SCROLL_HEIGHT_JS, SCROLL_TO_BOTTOM_JS};

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeNode {
    matches: Vec<Selector>,
    text: Option<String>,
    attributes: HashMap<String, String>,
    children: Vec<usize>,
    heights: Vec<i64>,
    grows_forever: bool,
    click_fails: bool,
    script_fails: bool,
}

impl FakeNode {
    pub fn matching(mut self, selector: Selector) -> Self {
        self.matches.push(selector);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Successive scrollHeight readings; the last one repeats.
    pub fn with_heights(mut self, heights: &[i64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    pub fn growing_forever(mut self) -> Self {
        self.grows_forever = true;
        self
    }

    pub fn with_click_failure(mut self) -> Self {
        self.click_fails = true;
        self
    }

    pub fn with_script_failure(mut self) -> Self {
        self.script_fails = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    nodes: Vec<FakeNode>,
}

impl FakePage {
    pub fn add(&mut self, node: FakeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_child(&mut self, parent: usize, node: FakeNode) -> usize {
        let id = self.add(node);
        self.nodes[parent].children.push(id);
        id
    }

    fn find_descendant(&self, parent: usize, selector: &Selector) -> Option<usize> {
        for &child in &self.nodes[parent].children {
            if self.nodes[child].matches.contains(selector) {
                return Some(child);
            }
            if let Some(found) = self.find_descendant(child, selector) {
                return Some(found);
            }
        }
        None
    }
}

#[derive(Debug, Default)]
struct FakeState {
    current: Option<String>,
    visited: Vec<String>,
    typed: Vec<String>,
    keys: Vec<String>,
    clicks: usize,
    script_clicks: usize,
    scrolls: usize,
    height_reads: HashMap<(String, usize), usize>,
    quit: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FakeSession {
    pages: HashMap<String, FakePage>,
    state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().keys.clone()
    }

    pub fn click_count(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    pub fn script_click_count(&self) -> usize {
        self.state.lock().unwrap().script_clicks
    }

    pub fn scroll_count(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    pub fn is_quit(&self) -> bool {
        self.state.lock().unwrap().quit
    }

    fn current(&self) -> Result<(String, &FakePage), ScraperError> {
        let url = self
            .state
            .lock()
            .unwrap()
            .current
            .clone()
            .ok_or_else(|| ScraperError::Navigation("no page loaded".into()))?;
        let page = &self.pages[&url];
        Ok((url, page))
    }

    fn node(&self, id: usize) -> Result<FakeNode, ScraperError> {
        let (_, page) = self.current()?;
        page.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| ScraperError::JavaScript(format!("stale element {}", id)))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = usize;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        if !self.pages.contains_key(url) {
            return Err(ScraperError::Navigation(format!("{}: unreachable", url)));
        }
        let mut state = self.state.lock().unwrap();
        state.current = Some(url.to_string());
        state.visited.push(url.to_string());
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> Result<usize, ScraperError> {
        let (_, page) = self.current()?;
        page.nodes
            .iter()
            .position(|node| node.matches.contains(selector))
            .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &Selector) -> Result<Vec<usize>, ScraperError> {
        let (_, page) = self.current()?;
        Ok(page
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.matches.contains(selector))
            .map(|(id, _)| id)
            .collect())
    }

    async fn find_child(&self, parent: &usize, selector: &Selector) -> Result<usize, ScraperError> {
        if let Selector::XPath(_) = selector {
            return Err(ScraperError::UnsupportedSelector(selector.to_string()));
        }
        let (_, page) = self.current()?;
        page.find_descendant(*parent, selector)
            .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))
    }

    async fn text(&self, element: &usize) -> Result<Option<String>, ScraperError> {
        Ok(self.node(*element)?.text)
    }

    async fn attribute(&self, element: &usize, name: &str) -> Result<Option<String>, ScraperError> {
        Ok(self.node(*element)?.attributes.get(name).cloned())
    }

    async fn click(&self, element: &usize) -> Result<(), ScraperError> {
        if self.node(*element)?.click_fails {
            return Err(ScraperError::Interaction("click intercepted".into()));
        }
        self.state.lock().unwrap().clicks += 1;
        Ok(())
    }

    async fn type_text(&self, element: &usize, text: &str) -> Result<(), ScraperError> {
        self.node(*element)?;
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn press_key(&self, element: &usize, key: &str) -> Result<(), ScraperError> {
        self.node(*element)?;
        self.state.lock().unwrap().keys.push(key.to_string());
        Ok(())
    }

    async fn call_on_element(&self, element: &usize, function: &str) -> Result<Value, ScraperError> {
        let node = self.node(*element)?;
        if node.script_fails {
            return Err(ScraperError::JavaScript("script threw".into()));
        }

        let mut state = self.state.lock().unwrap();
        match function {
            SCROLL_TO_BOTTOM_JS => {
                state.scrolls += 1;
                Ok(Value::Null)
            }
            SCROLL_HEIGHT_JS => {
                let url = state.current.clone().unwrap_or_default();
                let reads = state.height_reads.entry((url, *element)).or_insert(0);
                let height = if node.grows_forever {
                    (*reads as i64 + 1) * 100
                } else {
                    let last = node.heights.len().saturating_sub(1);
                    node.heights.get((*reads).min(last)).copied().unwrap_or(0)
                };
                *reads += 1;
                Ok(Value::from(height))
            }
            CLICK_JS => {
                if node.click_fails {
                    return Err(ScraperError::Interaction("click intercepted".into()));
                }
                state.script_clicks += 1;
                Ok(Value::Null)
            }
            other => Err(ScraperError::JavaScript(format!("unsupported script: {}", other))),
        }
    }

    async fn quit(&mut self) -> Result<(), ScraperError> {
        self.state.lock().unwrap().quit = true;
        Ok(())
    }
}
