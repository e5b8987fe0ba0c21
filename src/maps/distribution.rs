//! One-time fill of the per-star review breakdown.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::store::RestaurantStore;
use crate::traits::BrowserSession;

use super::reviews::open_reviews_tab;
use super::selectors::{detail, ARIA_LABEL};
use super::types::{DistributionReport, PendingRestaurant, RatingDistribution, StepOutcome};

const BREAKDOWN_ROWS: usize = 5;

#[derive(Debug, Default)]
pub struct DistributionHarvest {
    pub distribution: RatingDistribution,
    pub rows_unmatched: usize,
}

/// Read the breakdown table of one restaurant. Levels whose row cannot be
/// read stay at zero.
pub async fn harvest_distribution<S: BrowserSession>(
    session: &S,
    restaurant: &PendingRestaurant,
    config: &ScraperConfig,
) -> Result<DistributionHarvest, ScraperError> {
    info!("Scraping rating distribution for restaurant ID {}", restaurant.id);
    let rules = config.locale.rules();

    session.navigate(&restaurant.url).await?;
    sleep(config.pacing.distribution_page_load).await;

    open_reviews_tab(session, rules, config).await;

    let rows = match session.find_elements(&detail::DISTRIBUTION_ROW).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Could not list breakdown rows: {}", e);
            Vec::new()
        }
    };

    let mut harvest = DistributionHarvest::default();

    for row in rows.iter().take(BREAKDOWN_ROWS) {
        let label: StepOutcome<String> = session.attribute(row, ARIA_LABEL).await.into();
        match label {
            StepOutcome::Found(label) => match rules.parse_distribution_row(&label) {
                Some((stars, count)) => harvest.distribution.set(stars, count),
                None => {
                    warn!("No match for breakdown label: {}", label);
                    harvest.rows_unmatched += 1;
                }
            },
            StepOutcome::Empty => {
                warn!("Breakdown row has no label");
                harvest.rows_unmatched += 1;
            }
            StepOutcome::Failed(e) => {
                warn!("Error parsing breakdown row: {}", e);
                harvest.rows_unmatched += 1;
            }
        }
    }

    Ok(harvest)
}

/// Fill the breakdown for up to `distribution_batch_limit` restaurants that
/// have none. Each restaurant is written as soon as it is scraped.
pub async fn harvest_pending_distributions<S: BrowserSession>(
    session: &S,
    store: &mut RestaurantStore,
    config: &ScraperConfig,
) -> Result<DistributionReport, ScraperError> {
    let pending = store.restaurants_pending_distribution(config.distribution_batch_limit)?;
    info!("Scraping rating distributions for {} restaurants...", pending.len());

    let mut report = DistributionReport::default();

    for restaurant in &pending {
        match harvest_distribution(session, restaurant, config).await {
            Ok(harvest) => {
                info!(
                    "Restaurant ID {}: {} ratings across the breakdown",
                    restaurant.id,
                    harvest.distribution.total()
                );
                store.update_distribution(restaurant.id, &harvest.distribution)?;
                report.restaurants_updated += 1;
                report.rows_unmatched += harvest.rows_unmatched;
            }
            Err(e) => {
                warn!("Failed to scrape {}: {}", restaurant.url, e);
                report.restaurants_failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pacing;
    use crate::maps::fake::{FakeNode, FakePage, FakeSession};
    use crate::maps::types::Listing;
    use crate::parse::Locale;
    use crate::traits::Selector;

    fn config() -> ScraperConfig {
        ScraperConfig::new(":memory:")
            .with_locale(Locale::Hebrew)
            .with_pacing(Pacing::none())
    }

    fn breakdown_page(labels: &[&str]) -> FakePage {
        let mut page = FakePage::default();
        page.add(
            FakeNode::default().matching(Selector::XPath(Locale::Hebrew.rules().reviews_tab_xpath)),
        );
        for label in labels {
            page.add(
                FakeNode::default()
                    .matching(detail::DISTRIBUTION_ROW)
                    .with_attr(ARIA_LABEL, label),
            );
        }
        page
    }

    fn listing(url: &str) -> Listing {
        Listing {
            name: "מסעדה".into(),
            url: url.into(),
            rating: Some(4.4),
            review_count: Some(100),
            city: "תל אביב".into(),
        }
    }

    #[tokio::test]
    async fn test_harvest_distribution_parses_rows() {
        let session = FakeSession::new().with_page(
            "fake://d/1",
            breakdown_page(&[
                "\u{200F}5 כוכבים, 1,210 ביקורות",
                "4 כוכבים, 300 ביקורות",
                "3 כוכבים, 41 ביקורות",
                "משהו אחר",
                "כוכב אחד, 12 ביקורות",
                "2 כוכבים, 999 ביקורות",
            ]),
        );
        let restaurant = PendingRestaurant {
            id: 1,
            url: "fake://d/1".into(),
        };

        let harvest = harvest_distribution(&session, &restaurant, &config()).await.unwrap();

        // Only the first five rows are read
        assert_eq!(harvest.distribution.counts, [12, 0, 41, 300, 1210]);
        assert_eq!(harvest.rows_unmatched, 1);
        assert_eq!(session.click_count(), 1);
    }

    #[tokio::test]
    async fn test_pending_distributions_fill_once() {
        let mut store = RestaurantStore::open_in_memory().unwrap();
        store
            .insert_listings(&[listing("fake://d/1"), listing("fake://d/down")])
            .unwrap();

        let session = FakeSession::new().with_page(
            "fake://d/1",
            breakdown_page(&["5 כוכבים, 10 ביקורות", "4 כוכבים, 2 ביקורות"]),
        );

        let report = harvest_pending_distributions(&session, &mut store, &config())
            .await
            .unwrap();
        assert_eq!(report.restaurants_updated, 1);
        assert_eq!(report.restaurants_failed, 1);

        let pending = store.restaurants_pending_distribution(60).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "fake://d/down");

        let filled = store.distribution_for(1).unwrap().unwrap();
        assert_eq!(filled.counts, [0, 0, 0, 2, 10]);

        // The filled restaurant is never visited again
        let visits_before = session.visited().len();
        let again = harvest_pending_distributions(&session, &mut store, &config())
            .await
            .unwrap();
        assert_eq!(again.restaurants_updated, 0);
        assert_eq!(again.restaurants_failed, 1);
        assert_eq!(session.visited().len(), visits_before);
    }

    #[tokio::test]
    async fn test_page_without_table_stores_zeros() {
        let mut store = RestaurantStore::open_in_memory().unwrap();
        store.insert_listings(&[listing("fake://d/empty")]).unwrap();
        let session = FakeSession::new().with_page("fake://d/empty", FakePage::default());

        let report = harvest_pending_distributions(&session, &mut store, &config())
            .await
            .unwrap();

        assert_eq!(report.restaurants_updated, 1);
        assert_eq!(
            store.distribution_for(1).unwrap(),
            Some(RatingDistribution::default())
        );
        assert!(store.restaurants_pending_distribution(60).unwrap().is_empty());
    }
}
