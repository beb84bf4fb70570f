mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_returns_200() {
    let app = common::create_test_app(common::test_config());
    let (status, _) = common::get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_payload_has_fixed_shape() {
    let app = common::create_test_app(common::test_config());
    let (_, body) = common::get_json(app, "/health").await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "instagram-scraper-api");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_is_exempt_from_rate_limits() {
    let mut config = common::test_config();
    config.default_rate_limit_per_minute = 1;
    config.scrape_rate_limit_per_minute = 1;
    let app = common::create_test_app(config);

    for _ in 0..5 {
        let (status, _) = common::get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
