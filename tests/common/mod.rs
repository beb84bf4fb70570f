// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_governor::GovernorLayer;

use instagram_scraper_api::{
    config::Config, handlers, rate_limit, scraper::InstagramScraper, state::AppState,
};

/// Configuration for tests: tight timeouts, no retry delay, and an LLM base
/// URL pointing at an unroutable port so nothing escapes the test host.
pub fn test_config() -> Config {
    Config {
        openai_api_key: "sk-test".into(),
        openai_model: "gpt-4o-mini".into(),
        openai_base_url: "http://127.0.0.1:9".into(),
        server_host: "127.0.0.1".into(),
        server_port: 0,
        scrape_timeout: Duration::from_secs(5),
        llm_timeout: Duration::from_secs(1),
        fetch_timeout: Duration::from_secs(2),
        browser_wait: Duration::from_millis(0),
        max_retries: 1,
        retry_delay: Duration::from_millis(0),
        default_rate_limit_per_minute: 1000,
        scrape_rate_limit_per_minute: 1000,
        llm_max_content_chars: 20_000,
        is_dev: true,
    }
}

/// Build the application router the same way main does, minus the server.
pub fn create_test_app(config: Config) -> Router {
    let scraper = InstagramScraper::new(&config);
    let state = AppState {
        config: Arc::new(config.clone()),
        scraper: Arc::new(scraper),
    };

    let scrape_routes = Router::new()
        .route("/scrape", post(handlers::scrape::scrape_post))
        .layer(GovernorLayer {
            config: rate_limit::per_minute(config.scrape_rate_limit_per_minute),
        })
        .layer(GovernorLayer {
            config: rate_limit::per_minute(config.default_rate_limit_per_minute),
        });

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(scrape_routes)
        .with_state(state)
}

pub async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        // SmartIpKeyExtractor needs a client identity; oneshot requests have
        // no peer address.
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_raw(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
