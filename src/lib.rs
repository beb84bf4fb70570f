pub mod config;
pub mod error;
pub mod handlers;
pub mod instagram;
pub mod models;
pub mod rate_limit;
pub mod scraper;
pub mod state;
