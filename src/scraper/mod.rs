//! The scrape pipeline: fetch the rendered post page with a headless
//! browser, then hand the page text to the LLM extractor for structured
//! field extraction.

mod browser;
mod llm;

pub use browser::PageFetcher;
pub use llm::LlmExtractor;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::instagram;
use crate::models::InstagramPost;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Instagram post is private, deleted, or not accessible")]
    Inaccessible,

    #[error("Unable to extract data from Instagram post. The post may be private or inaccessible.")]
    NoContent,

    #[error("Instagram is rate limiting requests. Please try again later.")]
    Throttled,

    #[error("AI processing service is temporarily unavailable")]
    LlmUnavailable { detail: String },

    #[error("AI processing service is temporarily unavailable")]
    LlmTransient { detail: String },

    #[error("AI service returned malformed output")]
    MalformedOutput { detail: String },

    #[error("Network error occurred. Please try again.")]
    Network { detail: String },

    #[error("Scraping timeout. The request took too long to process.")]
    Timeout,

    #[error("Browser error: {detail}")]
    Browser { detail: String },
}

impl ScrapeError {
    /// Whether another attempt could plausibly succeed. Access failures and
    /// credential/quota problems will not fix themselves within a request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScrapeError::Throttled
                | ScrapeError::LlmTransient { .. }
                | ScrapeError::Network { .. }
                | ScrapeError::Timeout
        )
    }
}

/// Classify a raw upstream failure message into a pipeline error.
///
/// Upstream failures arrive as strings (CDP errors, page markers, HTTP
/// client errors), so the category is recovered by keyword matching.
pub(crate) fn classify_fetch_error(detail: &str) -> ScrapeError {
    let lowered = detail.to_lowercase();

    if ["private", "not found", "404", "access denied", "403"]
        .iter()
        .any(|kw| lowered.contains(kw))
    {
        return ScrapeError::Inaccessible;
    }
    if ["rate limit", "blocked", "too many requests", "429"]
        .iter()
        .any(|kw| lowered.contains(kw))
    {
        return ScrapeError::Throttled;
    }
    if lowered.contains("timeout") || lowered.contains("timed out") {
        return ScrapeError::Timeout;
    }
    if ["network", "connection", "dns", "name_not_resolved"]
        .iter()
        .any(|kw| lowered.contains(kw))
    {
        return ScrapeError::Network {
            detail: detail.to_string(),
        };
    }

    ScrapeError::Browser {
        detail: detail.to_string(),
    }
}

/// Run `op` up to `max_attempts` times with a fixed `delay` between attempts.
/// Only transient failures are retried; anything else surfaces immediately.
pub(crate) async fn with_retries<T, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %err, "Transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Orchestrates the two-stage pipeline. One instance is shared by all
/// requests; the underlying browser is launched lazily on first use.
pub struct InstagramScraper {
    fetcher: PageFetcher,
    extractor: LlmExtractor,
    max_retries: u32,
    retry_delay: Duration,
}

impl InstagramScraper {
    pub fn new(config: &Config) -> Self {
        InstagramScraper {
            fetcher: PageFetcher::new(
                config.fetch_timeout,
                config.browser_wait,
                config.llm_max_content_chars,
            ),
            extractor: LlmExtractor::new(
                &config.openai_api_key,
                &config.openai_model,
                &config.openai_base_url,
                config.llm_timeout,
            ),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Scrape a single post URL. The URL must already have passed
    /// `instagram::is_valid_post_url`.
    pub async fn scrape_post(&self, url: &str) -> Result<InstagramPost, ScrapeError> {
        let content = with_retries(self.max_retries, self.retry_delay, |attempt| {
            info!(url, attempt, "Fetching rendered post page");
            self.fetcher.fetch_text(url)
        })
        .await?;

        if content.trim().is_empty() {
            return Err(ScrapeError::NoContent);
        }

        let mut post = with_retries(self.max_retries, self.retry_delay, |attempt| {
            info!(url, attempt, "Extracting structured fields");
            self.extractor.extract_post(&content, url)
        })
        .await?;

        // The model sometimes omits fields it was told about in the prompt;
        // both are derivable from the request URL.
        if post.url.is_none() {
            post.url = Some(url.to_string());
        }
        if post.short_code.is_none() {
            post.short_code = instagram::extract_shortcode(url);
        }

        info!(
            url,
            kind = post.post_type.map(|t| t.to_string()).as_deref().unwrap_or("unknown"),
            "Scrape completed"
        );
        Ok(post)
    }
}
