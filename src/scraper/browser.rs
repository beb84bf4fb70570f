//! Headless-Chromium page fetching.
//!
//! Instagram renders post pages client-side, so a plain HTTP GET returns a
//! shell document. A real browser is launched (lazily, once) and each fetch
//! opens a fresh tab, waits for the page to settle, and captures the
//! rendered HTML, which is then reduced to clean text for the extractor.

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use scraper::{Html, Selector};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::{classify_fetch_error, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Page-text markers Instagram serves for deleted, private, or otherwise
/// unreachable posts. Chromium renders these as ordinary 200 pages, so
/// inaccessibility has to be detected from the content itself.
const UNAVAILABLE_MARKERS: [&str; 3] = [
    "sorry, this page isn't available",
    "the link you followed may be broken",
    "this account is private",
];

pub struct PageFetcher {
    browser: Mutex<Option<Arc<Browser>>>,
    fetch_timeout: Duration,
    settle: Duration,
    max_chars: usize,
}

impl PageFetcher {
    pub fn new(fetch_timeout: Duration, settle: Duration, max_chars: usize) -> Self {
        PageFetcher {
            browser: Mutex::new(None),
            fetch_timeout,
            settle,
            max_chars,
        }
    }

    async fn get_or_launch(&self) -> Result<Arc<Browser>, ScrapeError> {
        let mut guard = self.browser.lock().await;
        if let Some(browser) = guard.as_ref() {
            return Ok(Arc::clone(browser));
        }

        let config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={USER_AGENT}"))
            .build()
            .map_err(|e| ScrapeError::Browser {
                detail: format!("browser config error: {e}"),
            })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ScrapeError::Browser {
                    detail: format!("browser launch failed: {e}"),
                })?;

        // The handler stream drives all CDP traffic; it must be polled for
        // the lifetime of the browser.
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        let shared = Arc::new(browser);
        *guard = Some(Arc::clone(&shared));
        Ok(shared)
    }

    /// Fetch `url` in a fresh tab and return the rendered page as clean
    /// text, truncated to the configured maximum.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let target = Url::parse(url).map_err(|e| ScrapeError::Browser {
            detail: format!("invalid url: {e}"),
        })?;
        let browser = self.get_or_launch().await?;

        let page = tokio::time::timeout(self.fetch_timeout, browser.new_page(target.as_str()))
            .await
            .map_err(|_| ScrapeError::Timeout)?
            .map_err(|e| classify_fetch_error(&format!("failed to open page: {e}")))?;

        // Navigation can already be finished by the time we start waiting;
        // treat the wait as best-effort.
        let _ = tokio::time::timeout(self.fetch_timeout, page.wait_for_navigation()).await;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let html = tokio::time::timeout(self.fetch_timeout, page.content())
            .await
            .map_err(|_| ScrapeError::Timeout)?
            .map_err(|e| classify_fetch_error(&format!("failed to get content: {e}")))?;

        if let Err(e) = page.close().await {
            debug!(url, error = %e, "Page close error (tab leak)");
        }

        let text = reduce_page_text(&html);
        if is_unavailable_page(&text) {
            warn!(url, "Post page renders as unavailable");
            return Err(ScrapeError::Inaccessible);
        }

        Ok(truncate_chars(&text, self.max_chars))
    }
}

/// Reduce rendered HTML to whitespace-normalized text, preferring the post
/// `<article>` (what Instagram wraps a post in) over the whole body.
pub(crate) fn reduce_page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    for selector_str in ["article", "main", "body"] {
        let Ok(sel) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = el
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

pub(crate) fn is_unavailable_page(text: &str) -> bool {
    let lowered = text.to_lowercase();
    UNAVAILABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Truncate on a character boundary; `max` of zero disables the cap.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if max == 0 || text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_text_over_body() {
        let html = r#"<html><body>
            <nav>Home Search Explore</nav>
            <article><h2>testuser</h2><p>A caption here</p></article>
        </body></html>"#;
        let text = reduce_page_text(html);
        assert!(text.contains("A caption here"));
        assert!(!text.contains("Explore"));
    }

    #[test]
    fn falls_back_to_body_without_article() {
        let html = "<html><body><p>just text</p></body></html>";
        assert_eq!(reduce_page_text(html), "just text");
    }

    #[test]
    fn collapses_whitespace() {
        let html = "<html><body><p>a\n\n   b\t c</p></body></html>";
        assert_eq!(reduce_page_text(html), "a b c");
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(reduce_page_text("<html><body></body></html>"), "");
    }

    #[test]
    fn detects_unavailable_page_marker() {
        assert!(is_unavailable_page(
            "Sorry, this page isn't available. The link you followed may be broken"
        ));
        assert!(is_unavailable_page("This Account is Private"));
    }

    #[test]
    fn regular_post_text_is_not_unavailable() {
        assert!(!is_unavailable_page(
            "testuser Sunset at the beach #sunset 1,234 likes"
        ));
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
    }

    #[test]
    fn zero_cap_keeps_everything() {
        assert_eq!(truncate_chars("abc", 0), "abc");
    }

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
