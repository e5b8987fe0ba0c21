//! Map search scraping stages
//!
//! - `listings`: search, scroll the result feed until it stops growing, store each card
//! - `reviews`: visit restaurants without reviews and store their reviews
//! - `distribution`: fill the per-star breakdown of restaurants that have none

mod distribution;
mod listings;
mod reviews;
mod scroll;
pub mod selectors;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use distribution::{harvest_distribution, harvest_pending_distributions, DistributionHarvest};
pub use listings::{discover_listings, extract_listings};
pub use reviews::{harvest_pending_reviews, harvest_reviews, ReviewBatch};
pub use scroll::{scroll_times, scroll_until_stable, SCROLL_HEIGHT_JS, SCROLL_TO_BOTTOM_JS};
pub use types::{
    review_fingerprint, DiscoveryReport, DistributionReport, Listing, NewReview,
    PendingRestaurant, PipelineReport, RatingDistribution, ReviewHarvestReport, ScrollOutcome,
    StageReport, StepOutcome,
};
