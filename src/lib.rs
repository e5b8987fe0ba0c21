//! Restaurant scraper for map search results
//!
//! - Search the map for restaurants in a city and store every result card
//! - Visit restaurants without reviews and store their reviews
//! - Fill each restaurant's per-star rating breakdown once
//!
//! # Usage
//!
//! ```rust,ignore
//! use maps_review_scraper::{PipelineRequest, PipelineService, Stage};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = PipelineService::new();
//!
//!     let request = PipelineRequest::new(Stage::DiscoverListings)
//!         .with_db_path("./RestaurantsReviews.db")
//!         .with_query("מסעדות בחיפה")
//!         .with_headless(false);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("{:?}", result.report);
//! }
//! ```
//!
//! # Driving a stage directly
//!
//! ```rust,ignore
//! use maps_review_scraper::{ChromeSession, RestaurantStore, ScraperConfig};
//! use maps_review_scraper::maps::harvest_pending_reviews;
//!
//! let config = ScraperConfig::default().with_review_batch_limit(5);
//! let mut store = RestaurantStore::open(&config.db_path)?;
//! let session = ChromeSession::launch(&config).await?;
//! let report = harvest_pending_reviews(&session, &mut store, &config).await?;
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod maps;
pub mod parse;
pub mod service;
pub mod store;
pub mod traits;

pub use browser::ChromeSession;
pub use config::{Pacing, ScraperConfig};
pub use error::ScraperError;
pub use parse::Locale;
pub use service::{PipelineRequest, PipelineService, Stage};
pub use store::RestaurantStore;
pub use traits::{BrowserSession, Selector};

pub use maps::{
    DiscoveryReport, DistributionReport, Listing, PipelineReport, ReviewHarvestReport, StageReport,
};
