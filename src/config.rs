use std::path::PathBuf;
use std::time::Duration;

use crate::parse::Locale;

pub const DEFAULT_DB_PATH: &str = "RestaurantsReviews.db";
pub const DEFAULT_QUERY: &str = "מסעדות בתל אביב";
pub const DEFAULT_MAPS_URL: &str = "https://www.google.com/maps";

/// Fixed sleeps between browser steps. There is no adaptive waiting; every
/// pause here is slept in full.
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    /// After opening the search surface
    pub search_page_load: Duration,
    /// After submitting the query
    pub search_submit: Duration,
    /// Between feed scroll commands
    pub feed_scroll_pause: Duration,
    /// After opening a detail page for review harvesting
    pub review_page_load: Duration,
    /// After opening a detail page for distribution harvesting
    pub distribution_page_load: Duration,
    /// After clicking the reviews tab
    pub tab_open: Duration,
    /// Between review panel scroll commands
    pub review_scroll_pause: Duration,
    /// After each "show more" click
    pub expand_pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            search_page_load: Duration::from_secs(3),
            search_submit: Duration::from_secs(5),
            feed_scroll_pause: Duration::from_secs(2),
            review_page_load: Duration::from_secs(4),
            distribution_page_load: Duration::from_secs(3),
            tab_open: Duration::from_secs(2),
            review_scroll_pause: Duration::from_millis(1500),
            expand_pause: Duration::from_millis(200),
        }
    }
}

impl Pacing {
    /// No sleeps at all.
    pub fn none() -> Self {
        Self {
            search_page_load: Duration::ZERO,
            search_submit: Duration::ZERO,
            feed_scroll_pause: Duration::ZERO,
            review_page_load: Duration::ZERO,
            distribution_page_load: Duration::ZERO,
            tab_open: Duration::ZERO,
            review_scroll_pause: Duration::ZERO,
            expand_pause: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub db_path: PathBuf,
    pub query: String,
    pub locale: Locale,
    pub maps_url: String,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub chrome_executable: Option<PathBuf>,
    /// Upper bound for the feed scroll-to-stable loop
    pub timeout: Duration,
    pub review_max_scrolls: usize,
    pub review_batch_limit: usize,
    pub distribution_batch_limit: usize,
    pub pacing: Pacing,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            query: DEFAULT_QUERY.to_string(),
            locale: Locale::Hebrew,
            maps_url: DEFAULT_MAPS_URL.to_string(),
            headless: true,
            window_size: (1920, 1080),
            chrome_executable: None,
            timeout: Duration::from_secs(60),
            review_max_scrolls: 2,
            review_batch_limit: 1,
            distribution_batch_limit: 60,
            pacing: Pacing::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_maps_url(mut self, url: impl Into<String>) -> Self {
        self.maps_url = url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_review_max_scrolls(mut self, scrolls: usize) -> Self {
        self.review_max_scrolls = scrolls;
        self
    }

    pub fn with_review_batch_limit(mut self, limit: usize) -> Self {
        self.review_batch_limit = limit;
        self
    }

    pub fn with_distribution_batch_limit(mut self, limit: usize) -> Self {
        self.distribution_batch_limit = limit;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}
