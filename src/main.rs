use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use instagram_scraper_api::config::Config;
use instagram_scraper_api::scraper::InstagramScraper;
use instagram_scraper_api::state::AppState;
use instagram_scraper_api::{handlers, rate_limit};

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "instagram_scraper_api=info,tower_http=info"
            .parse()
            .unwrap()
    });

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Instagram Scraper API starting...");

    // Load configuration — fatal if OPENAI_API_KEY is missing.
    let config = Config::from_env().expect("Failed to load configuration");
    info!("📝 Configuration loaded");

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("🔓 CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let addr = config.server_addr();

    let scraper = InstagramScraper::new(&config);
    let state = AppState {
        config: Arc::new(config),
        scraper: Arc::new(scraper),
    };

    // Two quotas on /scrape: the general per-client limit plus a stricter
    // scrape-specific one. /health stays exempt.
    let general_limit = rate_limit::per_minute(state.config.default_rate_limit_per_minute);
    let scrape_limit = rate_limit::per_minute(state.config.scrape_rate_limit_per_minute);

    let scrape_routes = Router::new()
        .route("/scrape", post(handlers::scrape::scrape_post))
        .layer(GovernorLayer {
            config: scrape_limit,
        })
        .layer(GovernorLayer {
            config: general_limit,
        });

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(scrape_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // ConnectInfo feeds the rate limiter's IP fallback when no forwarding
    // headers are present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed to start");
}
