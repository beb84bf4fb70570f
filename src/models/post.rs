use serde::{Deserialize, Serialize};
use strum::Display;

/// Kind of media behind a post. Carousels bundle several images/videos
/// under one shortcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostType {
    Image,
    Video,
    Carousel,
}

/// Normalized Instagram post metadata.
///
/// Every field is optional — what the extractor can fill depends entirely on
/// what the rendered page exposed. Wire names are camelCase and `type` is
/// reserved in Rust, hence the renames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub url: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub display_url: Option<String>,
    pub short_code: Option<String>,
    pub timestamp: Option<String>,
    pub likes_count: Option<u64>,
    pub comments_count: Option<u64>,
    pub video_view_count: Option<u64>,
    pub video_play_count: Option<u64>,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub location_name: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub mentions: Option<Vec<String>>,
    pub alt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub instagram_url: String,
}

/// Envelope returned by `POST /scrape`.
#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InstagramPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResponse {
    pub fn ok(post: InstagramPost) -> Self {
        ScrapeResponse {
            success: true,
            data: Some(post),
            error: None,
        }
    }
}
