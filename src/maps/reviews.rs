//! Review harvesting for restaurants that have none stored yet.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::parse::LocaleRules;
use crate::store::RestaurantStore;
use crate::traits::{BrowserSession, Selector};

use super::scroll::scroll_times;
use super::selectors::{detail, ARIA_LABEL};
use super::types::{NewReview, PendingRestaurant, ReviewHarvestReport, StepOutcome};

/// Reviews collected from one detail page.
#[derive(Debug, Default)]
pub struct ReviewBatch {
    pub reviews: Vec<NewReview>,
    pub containers_seen: usize,
    pub discarded: usize,
}

/// Click the reviews tab. Failure is logged and the caller carries on with
/// whatever the page already shows.
pub(crate) async fn open_reviews_tab<S: BrowserSession>(
    session: &S,
    rules: &LocaleRules,
    config: &ScraperConfig,
) -> bool {
    let tab = Selector::XPath(rules.reviews_tab_xpath);
    let clicked = match session.find_element(&tab).await {
        Ok(tab) => session.click(&tab).await,
        Err(e) => Err(e),
    };

    match clicked {
        Ok(()) => {
            sleep(config.pacing.tab_open).await;
            true
        }
        Err(e) => {
            warn!("Could not open reviews tab: {}", e);
            false
        }
    }
}

async fn scroll_review_panel<S: BrowserSession>(session: &S, config: &ScraperConfig) {
    let scrolled = match session.find_element(&detail::REVIEW_PANEL).await {
        Ok(panel) => {
            scroll_times(
                session,
                &panel,
                config.review_max_scrolls,
                config.pacing.review_scroll_pause,
            )
            .await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = scrolled {
        warn!("Could not scroll reviews: {}", e);
    }
}

/// Expand truncated reviews. A failed click leaves that one review truncated.
async fn expand_truncated<S: BrowserSession>(session: &S, config: &ScraperConfig) -> usize {
    let buttons = match session.find_elements(&detail::SHOW_MORE).await {
        Ok(buttons) => buttons,
        Err(e) => {
            debug!("No expandable reviews: {}", e);
            return 0;
        }
    };

    let mut expanded = 0;
    for button in &buttons {
        match session.script_click(button).await {
            Ok(()) => {
                expanded += 1;
                sleep(config.pacing.expand_pause).await;
            }
            Err(e) => warn!("Failed to expand review: {}", e),
        }
    }
    expanded
}

async fn review_text<S: BrowserSession>(
    session: &S,
    container: &S::Element,
) -> StepOutcome<String> {
    match session.find_child(container, &detail::REVIEW_TEXT).await {
        Ok(element) => {
            let text: StepOutcome<String> = session.text(&element).await.into();
            text.map(|text| text.trim().to_string())
        }
        Err(e) if e.is_absent() => StepOutcome::Empty,
        Err(e) => StepOutcome::Failed(e),
    }
}

async fn review_stars<S: BrowserSession>(
    session: &S,
    container: &S::Element,
    rules: &LocaleRules,
) -> StepOutcome<u8> {
    let label: StepOutcome<String> = match session.find_child(container, &detail::REVIEW_STARS).await
    {
        Ok(element) => session.attribute(&element, ARIA_LABEL).await.into(),
        Err(e) if e.is_absent() => StepOutcome::Empty,
        Err(e) => StepOutcome::Failed(e),
    };

    match label {
        StepOutcome::Found(label) => match rules.parse_review_stars(&label) {
            Some(stars) => StepOutcome::Found(stars),
            None => StepOutcome::Empty,
        },
        StepOutcome::Empty => StepOutcome::Empty,
        StepOutcome::Failed(e) => StepOutcome::Failed(e),
    }
}

/// Visit one restaurant's detail page and collect every complete review.
///
/// Only a failed navigation is an error. Every later step degrades to "less
/// data": no tab, no scrolling, no expansion, or no containers.
pub async fn harvest_reviews<S: BrowserSession>(
    session: &S,
    restaurant: &PendingRestaurant,
    config: &ScraperConfig,
) -> Result<ReviewBatch, ScraperError> {
    info!("Scraping reviews for restaurant ID {}", restaurant.id);
    let rules = config.locale.rules();

    session.navigate(&restaurant.url).await?;
    sleep(config.pacing.review_page_load).await;

    open_reviews_tab(session, rules, config).await;
    scroll_review_panel(session, config).await;
    let expanded = expand_truncated(session, config).await;
    debug!("Expanded {} truncated reviews", expanded);

    let containers = match session.find_elements(&detail::REVIEW_CONTAINER).await {
        Ok(containers) => containers,
        Err(e) => {
            warn!("Could not list review containers: {}", e);
            Vec::new()
        }
    };
    info!("Found {} review containers", containers.len());

    let mut batch = ReviewBatch {
        containers_seen: containers.len(),
        ..Default::default()
    };

    for container in &containers {
        let text = review_text(session, container).await;
        let stars = review_stars(session, container, rules).await;

        if let StepOutcome::Failed(e) = &text {
            warn!("Error reading review text: {}", e);
        }
        if let StepOutcome::Failed(e) = &stars {
            warn!("Error reading review stars: {}", e);
        }

        match (text, stars) {
            (StepOutcome::Found(text), StepOutcome::Found(stars)) if !text.is_empty() => {
                batch.reviews.push(NewReview::new(restaurant.id, stars, text));
            }
            _ => batch.discarded += 1,
        }
    }

    Ok(batch)
}

/// Harvest reviews for up to `review_batch_limit` restaurants with none stored.
///
/// Each restaurant's reviews are inserted in one batch as soon as its page is
/// done. A restaurant whose page cannot be opened is skipped.
pub async fn harvest_pending_reviews<S: BrowserSession>(
    session: &S,
    store: &mut RestaurantStore,
    config: &ScraperConfig,
) -> Result<ReviewHarvestReport, ScraperError> {
    let pending = store.restaurants_pending_reviews(config.review_batch_limit)?;
    info!("Scraping reviews for {} restaurants...", pending.len());

    let mut report = ReviewHarvestReport::default();

    for restaurant in &pending {
        let batch = match harvest_reviews(session, restaurant, config).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Failed to scrape restaurant {}: {}", restaurant.id, e);
                report.restaurants_failed += 1;
                continue;
            }
        };

        report.restaurants_visited += 1;
        report.containers_seen += batch.containers_seen;
        report.reviews_discarded += batch.discarded;

        if batch.reviews.is_empty() {
            warn!("No reviews to insert for restaurant {}", restaurant.id);
            continue;
        }

        let inserted = store.insert_reviews(&batch.reviews)?;
        report.reviews_inserted += inserted;
        info!("Inserted {} reviews for restaurant {}", inserted, restaurant.id);
    }

    info!("Finished scraping reviews");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pacing;
    use crate::maps::fake::{FakeNode, FakePage, FakeSession};
    use crate::maps::types::Listing;
    use crate::parse::Locale;

    fn config() -> ScraperConfig {
        ScraperConfig::new(":memory:")
            .with_locale(Locale::English)
            .with_pacing(Pacing::none())
            .with_review_batch_limit(10)
    }

    fn add_review(page: &mut FakePage, text: Option<&str>, label: Option<&str>) {
        let container = page.add(FakeNode::default().matching(detail::REVIEW_CONTAINER));
        if let Some(text) = text {
            page.add_child(
                container,
                FakeNode::default().matching(detail::REVIEW_TEXT).with_text(text),
            );
        }
        if let Some(label) = label {
            page.add_child(
                container,
                FakeNode::default()
                    .matching(detail::REVIEW_STARS)
                    .with_attr(ARIA_LABEL, label),
            );
        }
    }

    fn reviews_tab() -> Selector {
        Selector::XPath(Locale::English.rules().reviews_tab_xpath)
    }

    fn detail_page() -> FakePage {
        let mut page = FakePage::default();
        page.add(FakeNode::default().matching(reviews_tab()));
        page.add(
            FakeNode::default()
                .matching(detail::REVIEW_PANEL)
                .with_heights(&[800]),
        );
        page.add(FakeNode::default().matching(detail::SHOW_MORE));
        page.add(
            FakeNode::default()
                .matching(detail::SHOW_MORE)
                .with_click_failure(),
        );
        add_review(&mut page, Some("  Best shakshuka in town  "), Some("\u{200E}5 stars"));
        add_review(&mut page, Some("Slow service"), Some("1 star"));
        add_review(&mut page, Some(""), Some("4 stars"));
        add_review(&mut page, None, Some("3 stars"));
        add_review(&mut page, Some("No rating here"), Some("Local guide"));
        add_review(&mut page, Some("Missing stars element"), None);
        page
    }

    fn listing(url: &str) -> Listing {
        Listing {
            name: url.to_string(),
            url: url.to_string(),
            rating: None,
            review_count: None,
            city: "Tel Aviv".into(),
        }
    }

    #[tokio::test]
    async fn test_harvest_reviews_keeps_only_complete_reviews() {
        let session = FakeSession::new().with_page("fake://r/1", detail_page());
        let restaurant = PendingRestaurant {
            id: 1,
            url: "fake://r/1".into(),
        };

        let batch = harvest_reviews(&session, &restaurant, &config()).await.unwrap();

        assert_eq!(batch.containers_seen, 6);
        assert_eq!(batch.discarded, 4);
        assert_eq!(batch.reviews.len(), 2);
        assert_eq!(batch.reviews[0].text, "Best shakshuka in town");
        assert_eq!(batch.reviews[0].stars, 5);
        assert_eq!(batch.reviews[1].stars, 1);

        assert_eq!(session.click_count(), 1);
        assert_eq!(session.scroll_count(), 2);
        assert_eq!(session.script_click_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_tab_and_panel_still_extracts() {
        let mut page = FakePage::default();
        add_review(&mut page, Some("Still here"), Some("4 stars"));
        let session = FakeSession::new().with_page("fake://r/2", page);
        let restaurant = PendingRestaurant {
            id: 2,
            url: "fake://r/2".into(),
        };

        let batch = harvest_reviews(&session, &restaurant, &config()).await.unwrap();

        assert_eq!(batch.reviews.len(), 1);
        assert_eq!(session.click_count(), 0);
        assert_eq!(session.scroll_count(), 0);
    }

    #[tokio::test]
    async fn test_harvest_pending_reviews_inserts_and_skips_failures() {
        let mut store = RestaurantStore::open_in_memory().unwrap();
        store
            .insert_listings(&[listing("fake://r/1"), listing("fake://r/missing")])
            .unwrap();

        let session = FakeSession::new().with_page("fake://r/1", detail_page());

        let report = harvest_pending_reviews(&session, &mut store, &config()).await.unwrap();

        assert_eq!(report.restaurants_visited, 1);
        assert_eq!(report.restaurants_failed, 1);
        assert_eq!(report.reviews_inserted, 2);
        assert_eq!(report.reviews_discarded, 4);

        let pending = store.restaurants_pending_reviews(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "fake://r/missing");
    }

    #[tokio::test]
    async fn test_rescrape_does_not_duplicate_reviews() {
        let mut store = RestaurantStore::open_in_memory().unwrap();
        store.insert_listings(&[listing("fake://r/1")]).unwrap();
        let session = FakeSession::new().with_page("fake://r/1", detail_page());
        let restaurant = store.restaurants_pending_reviews(1).unwrap().remove(0);

        let first = harvest_reviews(&session, &restaurant, &config()).await.unwrap();
        let second = harvest_reviews(&session, &restaurant, &config()).await.unwrap();

        assert_eq!(store.insert_reviews(&first.reviews).unwrap(), 2);
        assert_eq!(store.insert_reviews(&second.reviews).unwrap(), 0);
        assert_eq!(store.review_count_for(restaurant.id).unwrap(), 2);
    }
}
