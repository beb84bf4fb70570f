use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::instagram;
use crate::models::{ScrapeRequest, ScrapeResponse};
use crate::state::AppState;

/// POST /scrape
///
/// Body: `{"instagram_url": "https://www.instagram.com/p/XXXXXXXXX/"}`.
/// Runs the full pipeline (rendered-page fetch, then LLM extraction) under
/// the configured deadline and returns the normalized post.
pub async fn scrape_post(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> AppResult<Json<ScrapeResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected scrape request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Content-Type must be application/json",
            _ => "Invalid request format",
        };
        AppError::Validation(message.to_string())
    })?;

    if !instagram::is_valid_post_url(&request.instagram_url) {
        return Err(AppError::Validation("Invalid Instagram URL format".into()));
    }

    info!(url = %request.instagram_url, "Starting scrape");

    let post = tokio::time::timeout(
        state.config.scrape_timeout,
        state.scraper.scrape_post(&request.instagram_url),
    )
    .await
    .map_err(|_| {
        warn!(url = %request.instagram_url, "Scrape deadline exceeded");
        AppError::Timeout("Scraping timeout. The request took too long to process.".into())
    })??;

    Ok(Json(ScrapeResponse::ok(post)))
}
