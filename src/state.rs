use std::sync::Arc;

use crate::config::Config;
use crate::scraper::InstagramScraper;

/// Shared application state passed to all handlers. Configuration is read
/// once at startup rather than re-read from the environment per request;
/// the scraper (and its lazily-launched browser) is shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scraper: Arc<InstagramScraper>,
}
