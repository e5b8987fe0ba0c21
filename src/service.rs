use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Utc;
use tower::Service;
use tracing::{error, info, warn};

use crate::browser::ChromeSession;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::maps::{
    discover_listings, harvest_pending_distributions, harvest_pending_reviews, PipelineReport,
    StageReport,
};
use crate::store::RestaurantStore;
use crate::traits::BrowserSession;

/// Pipeline stage to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DiscoverListings,
    HarvestReviews,
    HarvestDistributions,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub stage: Stage,
    pub config: ScraperConfig,
}

impl PipelineRequest {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            config: ScraperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.config.query = query.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }
}

/// Run one stage against an already acquired session and store.
pub async fn run_stage<S: BrowserSession>(
    stage: Stage,
    session: &S,
    store: &mut RestaurantStore,
    config: &ScraperConfig,
) -> Result<StageReport, ScraperError> {
    let report = match stage {
        Stage::DiscoverListings => {
            StageReport::Discovery(discover_listings(session, store, config).await?)
        }
        Stage::HarvestReviews => {
            StageReport::Reviews(harvest_pending_reviews(session, store, config).await?)
        }
        Stage::HarvestDistributions => {
            StageReport::Distribution(harvest_pending_distributions(session, store, config).await?)
        }
    };
    Ok(report)
}

/// Release both resources and hand back the stage result.
///
/// Cleanup failures are logged; they only surface when the stage itself
/// succeeded.
pub async fn finish<S: BrowserSession, T>(
    session: &mut S,
    store: RestaurantStore,
    outcome: Result<T, ScraperError>,
) -> Result<T, ScraperError> {
    let quit = session.quit().await;
    let closed = store.close();

    if let Err(e) = &outcome {
        error!("Stage failed: {}", e);
    }

    match (outcome, quit, closed) {
        (Ok(value), Ok(()), Ok(())) => Ok(value),
        (Ok(_), Err(e), _) | (Ok(_), Ok(()), Err(e)) => Err(e),
        (Err(e), quit, closed) => {
            if let Err(q) = quit {
                warn!("Browser did not shut down cleanly: {}", q);
            }
            if let Err(c) = closed {
                warn!("Store did not close cleanly: {}", c);
            }
            Err(e)
        }
    }
}

/// tower::Service that opens the store, launches the browser, runs one stage
/// and always releases both.
#[derive(Debug, Clone, Default)]
pub struct PipelineService {}

impl PipelineService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<PipelineRequest> for PipelineService {
    type Response = PipelineReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PipelineRequest) -> Self::Future {
        info!("Pipeline request received: stage={:?}", req.stage);

        Box::pin(async move {
            let PipelineRequest { stage, config } = req;
            let started_at = Utc::now();

            let mut store = RestaurantStore::open(&config.db_path)?;
            let mut session = match ChromeSession::launch(&config).await {
                Ok(session) => session,
                Err(e) => {
                    if let Err(c) = store.close() {
                        warn!("Store did not close cleanly: {}", c);
                    }
                    return Err(e);
                }
            };

            let outcome = run_stage(stage, &session, &mut store, &config).await;
            let report = finish(&mut session, store, outcome).await?;

            let result = PipelineReport {
                started_at,
                finished_at: Utc::now(),
                report,
            };
            info!("Pipeline stage {:?} complete", stage);
            Ok(result)
        })
    }
}
