//! Instagram post URL recognition.
//!
//! Only direct post links are accepted: `/p/` (feed posts), `/reel/` and
//! `/tv/` (video formats). Profile pages, explore pages, story links and
//! anything off-host are rejected before the pipeline ever runs.

use once_cell::sync::Lazy;
use regex::Regex;

static POST_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/(?:p|reel|tv)/([A-Za-z0-9_-]+)/?$")
        .expect("post URL regex compiles")
});

/// Returns `true` if `url` is a direct link to an Instagram post, reel or
/// IGTV video.
pub fn is_valid_post_url(url: &str) -> bool {
    POST_URL_RE.is_match(url)
}

/// Extracts the shortcode from a recognized post URL.
///
/// Returns `None` for URLs that `is_valid_post_url` would reject.
pub fn extract_shortcode(url: &str) -> Option<String> {
    POST_URL_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}
