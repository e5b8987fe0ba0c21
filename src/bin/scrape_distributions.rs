use maps_review_scraper::{PipelineRequest, PipelineService, ScraperError, Stage};
use tower::Service;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScraperError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("=== Rating distribution harvesting ===");

    let mut service = PipelineService::new();
    let result = service
        .call(PipelineRequest::new(Stage::HarvestDistributions))
        .await?;

    let summary = serde_json::to_string_pretty(&result)
        .unwrap_or_else(|e| format!("unprintable report: {}", e));
    println!("{}", summary);

    Ok(())
}
