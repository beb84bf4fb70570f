//! Per-client-IP rate limiting.
//!
//! Two limiters are layered on `/scrape`: a general per-minute quota and a
//! stricter scrape-specific one. `/health` is exempt. Keys come from
//! forwarding headers first so limits hold behind a reverse proxy.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorError;

pub type SharedGovernorConfig =
    Arc<GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>>>;

/// Build a governor allowing `limit` requests per client per minute.
///
/// The quota is modeled as a burst of `limit` cells replenishing evenly
/// across the minute.
pub fn per_minute(limit: u32) -> SharedGovernorConfig {
    let limit = limit.max(1);
    let period = Duration::from_millis(60_000 / u64::from(limit));

    Arc::new(
        GovernorConfigBuilder::default()
            .period(period)
            .burst_size(limit)
            .key_extractor(SmartIpKeyExtractor)
            .error_handler(rate_limit_response)
            .finish()
            .expect("governor configuration is valid"),
    )
}

fn rate_limit_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => {
            tracing::warn!(wait_time, "Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "error": "Rate limit exceeded. Please try again later.",
                    "retry_after": wait_time,
                })),
            )
                .into_response()
        }
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Unable to identify client for rate limiting",
            })),
        )
            .into_response(),
        GovernorError::Other { code, msg, .. } => (
            code,
            Json(json!({
                "success": false,
                "error": msg.unwrap_or_else(|| "Rate limiter error".to_string()),
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn too_many_requests_carries_retry_after() {
        let response = rate_limit_response(GovernorError::TooManyRequests {
            wait_time: 12,
            headers: None,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["retry_after"], 12);
        assert!(!json["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_extraction_failure_is_500() {
        let response = rate_limit_response(GovernorError::UnableToExtractKey);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
