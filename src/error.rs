use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser initialization failed: {0}")]
    BrowserInit(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("script evaluation failed: {0}")]
    JavaScript(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("selector not supported here: {0}")]
    UnsupportedSelector(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("file operation failed: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ScraperError {
    /// True when the error means "the thing is not on the page" rather than
    /// "talking to the page went wrong".
    pub fn is_absent(&self) -> bool {
        matches!(self, ScraperError::ElementNotFound(_))
    }
}
