//! Scroll loops for lazily-loaded containers

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::ScraperError;
use crate::traits::BrowserSession;

use super::types::ScrollOutcome;

pub const SCROLL_TO_BOTTOM_JS: &str = "function() { this.scrollTop = this.scrollHeight; }";
pub const SCROLL_HEIGHT_JS: &str = "function() { return this.scrollHeight; }";

async fn scroll_height<S: BrowserSession>(
    session: &S,
    element: &S::Element,
) -> Result<i64, ScraperError> {
    let value = session.call_on_element(element, SCROLL_HEIGHT_JS).await?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|h| h as i64))
        .ok_or_else(|| ScraperError::JavaScript(format!("scrollHeight was not a number: {}", value)))
}

async fn scroll_to_bottom<S: BrowserSession>(
    session: &S,
    element: &S::Element,
) -> Result<(), ScraperError> {
    session
        .call_on_element(element, SCROLL_TO_BOTTOM_JS)
        .await
        .map(|_| ())
}

/// Scroll until the container stops growing or `timeout` elapses.
///
/// Stops as soon as two consecutive height readings match. The timeout is
/// checked once per round, so the loop overruns it by at most one pause.
pub async fn scroll_until_stable<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    pause: Duration,
    timeout: Duration,
) -> Result<ScrollOutcome, ScraperError> {
    let start = Instant::now();
    let mut last_height = scroll_height(session, element).await?;
    let mut rounds = 0u32;

    loop {
        scroll_to_bottom(session, element).await?;
        sleep(pause).await;
        rounds += 1;

        let new_height = scroll_height(session, element).await?;
        debug!("Scroll round {}: height {} -> {}", rounds, last_height, new_height);

        if new_height == last_height {
            info!("Reached end of scroll after {} rounds", rounds);
            return Ok(ScrollOutcome::Stable {
                height: new_height,
                rounds,
            });
        }

        if start.elapsed() > timeout {
            info!("Scroll timeout reached after {:?}", start.elapsed());
            return Ok(ScrollOutcome::TimedOut {
                height: new_height,
                rounds,
            });
        }

        last_height = new_height;
    }
}

/// Scroll a fixed number of times without measuring anything.
pub async fn scroll_times<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    times: usize,
    pause: Duration,
) -> Result<usize, ScraperError> {
    for _ in 0..times {
        scroll_to_bottom(session, element).await?;
        sleep(pause).await;
    }
    Ok(times)
}
