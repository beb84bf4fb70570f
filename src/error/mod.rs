use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::scraper::ScrapeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream throttled: {0}")]
    UpstreamThrottled(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

/// Map pipeline failures onto HTTP categories. Transient errors reach this
/// point only after the retry budget is exhausted.
impl From<ScrapeError> for AppError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::Inaccessible | ScrapeError::NoContent => AppError::NotFound(e.to_string()),
            ScrapeError::Throttled => AppError::UpstreamThrottled(e.to_string()),
            ScrapeError::LlmUnavailable { ref detail }
            | ScrapeError::LlmTransient { ref detail } => {
                tracing::error!(detail = %detail, "LLM extraction failed");
                AppError::ServiceUnavailable(e.to_string())
            }
            ScrapeError::Network { ref detail } => {
                tracing::warn!(detail = %detail, "Upstream network failure");
                AppError::ServiceUnavailable(e.to_string())
            }
            ScrapeError::Timeout => AppError::Timeout(e.to_string()),
            ScrapeError::MalformedOutput { detail } | ScrapeError::Browser { detail } => {
                tracing::error!(detail = %detail, "Scrape pipeline failed");
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Timeout(msg) => (StatusCode::REQUEST_TIMEOUT, msg),
            AppError::UpstreamThrottled(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal => {
                tracing::error!("Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
