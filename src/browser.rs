//! Chrome-backed browser session

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, Selector};

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl ChromeSession {
    /// Launch Chrome and open a blank page.
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Launching browser...");

        let (width, height) = config.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .request_timeout(config.timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        info!("Browser ready");
        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler: Some(handler),
            shutdown_timeout: config.timeout,
        })
    }

    fn get_page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("browser session already closed".into()))
    }
}

/// Wait for the browser process to exit, giving up after `limit`.
async fn wait_for_exit<F, T>(wait: F, limit: Duration) -> Result<T, ScraperError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(limit, wait).await {
        Ok(exited) => Ok(exited?),
        Err(_) => Err(ScraperError::Timeout(format!(
            "browser still running after {:?}",
            limit
        ))),
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        debug!("Navigating to {}", url);
        self.get_page()?
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> Result<Element, ScraperError> {
        let page = self.get_page()?;
        let found = match selector {
            Selector::Css(css) => page.find_element(*css).await,
            Selector::XPath(xpath) => page.find_xpath(*xpath).await,
        };
        found.map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))
    }

    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Element>, ScraperError> {
        let page = self.get_page()?;
        let found = match selector {
            Selector::Css(css) => page.find_elements(*css).await,
            Selector::XPath(xpath) => page.find_xpaths(*xpath).await,
        };
        found.map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))
    }

    async fn find_child(
        &self,
        parent: &Element,
        selector: &Selector,
    ) -> Result<Element, ScraperError> {
        match selector {
            Selector::Css(css) => parent
                .find_element(*css)
                .await
                .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e))),
            Selector::XPath(_) => Err(ScraperError::UnsupportedSelector(selector.to_string())),
        }
    }

    async fn text(&self, element: &Element) -> Result<Option<String>, ScraperError> {
        element
            .inner_text()
            .await
            .map_err(|e| ScraperError::JavaScript(format!("innerText: {}", e)))
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, ScraperError> {
        element
            .attribute(name)
            .await
            .map_err(|e| ScraperError::JavaScript(format!("attribute {}: {}", name, e)))
    }

    async fn click(&self, element: &Element) -> Result<(), ScraperError> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Interaction(format!("click: {}", e)))
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), ScraperError> {
        element
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Interaction(format!("type: {}", e)))
    }

    async fn press_key(&self, element: &Element, key: &str) -> Result<(), ScraperError> {
        element
            .press_key(key)
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Interaction(format!("key {}: {}", key, e)))
    }

    async fn call_on_element(
        &self,
        element: &Element,
        function: &str,
    ) -> Result<serde_json::Value, ScraperError> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

        if let Some(details) = returns.exception_details {
            return Err(ScraperError::JavaScript(details.text));
        }

        Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn quit(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close command failed, killing process: {}", e);
                if let Some(Err(e)) = browser.kill().await {
                    warn!("Could not kill browser process: {}", e);
                }
            }
            let exited = wait_for_exit(browser.wait(), self.shutdown_timeout).await;
            if let Some(handler) = self.handler.take() {
                handler.abort();
            }
            exited?;
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        info!("Browser closed");
        Ok(())
    }
}
