//! Listing discovery: search, scroll the feed dry, read every card.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::parse::{LocaleRules, RatingLabel};
use crate::store::RestaurantStore;
use crate::traits::BrowserSession;

use super::scroll::scroll_until_stable;
use super::selectors::{search, ARIA_LABEL, HREF};
use super::types::{DiscoveryReport, Listing, ScrollOutcome, StepOutcome};

/// Open the search surface and submit the query.
async fn submit_search<S: BrowserSession>(
    session: &S,
    config: &ScraperConfig,
) -> Result<(), ScraperError> {
    session.navigate(&config.maps_url).await?;
    sleep(config.pacing.search_page_load).await;

    let search_box = session.find_element(&search::SEARCH_BOX).await?;
    session.type_text(&search_box, &config.query).await?;
    session.press_key(&search_box, "Enter").await?;
    sleep(config.pacing.search_submit).await;

    Ok(())
}

async fn scroll_feed<S: BrowserSession>(session: &S, config: &ScraperConfig) -> ScrollOutcome {
    let feed = match session.find_element(&search::FEED).await {
        Ok(feed) => feed,
        Err(e) => {
            warn!("Result feed not found, extracting visible cards only: {}", e);
            return ScrollOutcome::Unavailable;
        }
    };

    match scroll_until_stable(session, &feed, config.pacing.feed_scroll_pause, config.timeout).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Feed scrolling failed, extracting visible cards only: {}", e);
            ScrollOutcome::Unavailable
        }
    }
}

/// Rating sub-parse for one card. A missing or unreadable label nulls both fields.
async fn card_rating<S: BrowserSession>(
    session: &S,
    card: &S::Element,
    rules: &LocaleRules,
) -> RatingLabel {
    let label: StepOutcome<String> = match session.find_child(card, &search::CARD_RATING).await {
        Ok(element) => session.attribute(&element, ARIA_LABEL).await.into(),
        Err(e) if e.is_absent() => StepOutcome::Empty,
        Err(e) => StepOutcome::Failed(e),
    };

    match label {
        StepOutcome::Found(label) => rules.parse_rating_label(&label),
        StepOutcome::Empty => RatingLabel::default(),
        StepOutcome::Failed(e) => {
            debug!("Rating label unreadable: {}", e);
            RatingLabel::default()
        }
    }
}

async fn extract_card<S: BrowserSession>(
    session: &S,
    card: &S::Element,
    city: &str,
    rules: &LocaleRules,
) -> Result<Listing, ScraperError> {
    let name_element = session.find_child(card, &search::CARD_NAME).await?;
    let name = session
        .text(&name_element)
        .await?
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ScraperError::ElementNotFound("card name is empty".into()))?;

    let link = session.find_child(card, &search::CARD_LINK).await?;
    let url = session
        .attribute(&link, HREF)
        .await?
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ScraperError::ElementNotFound("card link has no href".into()))?;

    let RatingLabel {
        rating,
        review_count,
    } = card_rating(session, card, rules).await;

    Ok(Listing {
        name,
        url,
        rating,
        review_count,
        city: city.to_string(),
    })
}

/// Read one listing per visible result card. Cards without a name or link are
/// skipped; the returned count says how many.
pub async fn extract_listings<S: BrowserSession>(
    session: &S,
    city: &str,
    rules: &LocaleRules,
) -> (Vec<Listing>, usize) {
    let cards = match session.find_elements(&search::RESULT_CARD).await {
        Ok(cards) => cards,
        Err(e) => {
            warn!("Could not list result cards: {}", e);
            return (Vec::new(), 0);
        }
    };

    let mut listings = Vec::with_capacity(cards.len());
    let mut skipped = 0;

    for (idx, card) in cards.iter().enumerate() {
        match extract_card(session, card, city, rules).await {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                skipped += 1;
                warn!("Skipped card {} due to error: {}", idx, e);
            }
        }
    }

    (listings, skipped)
}

/// Search, scroll the feed until it stops growing, and store every card.
pub async fn discover_listings<S: BrowserSession>(
    session: &S,
    store: &mut RestaurantStore,
    config: &ScraperConfig,
) -> Result<DiscoveryReport, ScraperError> {
    let rules = config.locale.rules();
    let city = rules.extract_city(&config.query);
    info!("Searching for '{}' (city: {})", config.query, city);

    let mut report = DiscoveryReport {
        query: config.query.clone(),
        city: city.clone(),
        scroll: ScrollOutcome::Unavailable,
        cards_seen: 0,
        cards_skipped: 0,
        listings: 0,
        inserted: 0,
    };

    if let Err(e) = submit_search(session, config).await {
        warn!("Search could not be submitted: {}", e);
        return Ok(report);
    }

    report.scroll = scroll_feed(session, config).await;

    let (listings, skipped) = extract_listings(session, &city, rules).await;
    info!("Found {} restaurants in {}", listings.len(), city);

    report.cards_seen = listings.len() + skipped;
    report.cards_skipped = skipped;
    report.listings = listings.len();
    report.inserted = store.insert_listings(&listings)?;

    info!("Inserted {} new restaurants", report.inserted);
    Ok(report)
}
