//! Records produced by the scraping stages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ScraperError;

/// One result card from the listing feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub url: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub city: String,
}

/// A stored restaurant that still needs harvesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRestaurant {
    pub id: i64,
    pub url: String,
}

/// A review ready for storage. Only built when both stars and text exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub review_id: String,
    pub restaurant_id: i64,
    pub stars: u8,
    pub text: String,
}

impl NewReview {
    pub fn new(restaurant_id: i64, stars: u8, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            review_id: review_fingerprint(restaurant_id, &text),
            restaurant_id,
            stars,
            text,
        }
    }
}

/// Stable review id derived from the owning restaurant and the review body.
pub fn review_fingerprint(restaurant_id: i64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(restaurant_id.to_le_bytes());
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Review counts per star level, index 0 holding one-star reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub counts: [i64; 5],
}

impl RatingDistribution {
    pub fn set(&mut self, stars: u8, count: i64) {
        if let Some(slot) = (stars as usize)
            .checked_sub(1)
            .and_then(|i| self.counts.get_mut(i))
        {
            *slot = count;
        }
    }

    pub fn get(&self, stars: u8) -> Option<i64> {
        (stars as usize)
            .checked_sub(1)
            .and_then(|i| self.counts.get(i))
            .copied()
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }
}

/// Result of one extraction step.
///
/// `Empty` means the page simply does not have the thing; `Failed` means we
/// could not find out.
#[derive(Debug)]
pub enum StepOutcome<T> {
    Found(T),
    Empty,
    Failed(ScraperError),
}

impl<T> StepOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepOutcome<U> {
        match self {
            StepOutcome::Found(value) => StepOutcome::Found(f(value)),
            StepOutcome::Empty => StepOutcome::Empty,
            StepOutcome::Failed(e) => StepOutcome::Failed(e),
        }
    }
}

impl<T> From<Result<T, ScraperError>> for StepOutcome<T> {
    fn from(result: Result<T, ScraperError>) -> Self {
        match result {
            Ok(value) => StepOutcome::Found(value),
            Err(e) if e.is_absent() => StepOutcome::Empty,
            Err(e) => StepOutcome::Failed(e),
        }
    }
}

impl From<Result<Option<String>, ScraperError>> for StepOutcome<String> {
    fn from(result: Result<Option<String>, ScraperError>) -> Self {
        match result {
            Ok(Some(value)) if !value.trim().is_empty() => StepOutcome::Found(value),
            Ok(_) => StepOutcome::Empty,
            Err(e) if e.is_absent() => StepOutcome::Empty,
            Err(e) => StepOutcome::Failed(e),
        }
    }
}

/// How the feed scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScrollOutcome {
    /// Height unchanged between two consecutive measurements
    Stable { height: i64, rounds: u32 },
    TimedOut { height: i64, rounds: u32 },
    /// The feed could not be located or scrolled
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub query: String,
    pub city: String,
    pub scroll: ScrollOutcome,
    pub cards_seen: usize,
    pub cards_skipped: usize,
    pub listings: usize,
    pub inserted: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewHarvestReport {
    pub restaurants_visited: usize,
    pub restaurants_failed: usize,
    pub containers_seen: usize,
    pub reviews_discarded: usize,
    pub reviews_inserted: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionReport {
    pub restaurants_updated: usize,
    pub restaurants_failed: usize,
    pub rows_unmatched: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageReport {
    Discovery(DiscoveryReport),
    Reviews(ReviewHarvestReport),
    Distribution(DistributionReport),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub report: StageReport,
}
