//! Structured-output extraction over an OpenAI-compatible chat-completions
//! endpoint.
//!
//! The page text is sent with a strict JSON-schema response format that
//! mirrors [`InstagramPost`], so the reply parses straight into the model
//! with no field mapping of its own.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::error;

use super::ScrapeError;
use crate::models::InstagramPost;

const SYSTEM_PROMPT: &str = "You are an expert Instagram post analyzer. \
Extract all relevant information from the scraped Instagram post content.\n\
\n\
- Extract the post caption, removing any extra formatting\n\
- Identify whether it is an image, video, or carousel post\n\
- Extract engagement metrics (likes, comments, views)\n\
- Find owner information (username, full name)\n\
- Extract hashtags and mentions from the caption\n\
- Get media URLs if available\n\
- Extract timestamp information\n\
- Include location if mentioned\n\
- Extract alt text for accessibility\n\
\n\
Only include information that is clearly present in the content; leave \
everything else null.";

pub struct LlmExtractor {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl LlmExtractor {
    pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Self {
        LlmExtractor {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    /// Extract post fields from rendered page text.
    pub async fn extract_post(
        &self,
        content: &str,
        source_url: &str,
    ) -> Result<InstagramPost, ScrapeError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Analyze this Instagram post content and extract the structured data.\n\n\
                         URL: {source_url}\n\nContent:\n{content}"
                    ),
                },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "instagram_post",
                    "strict": true,
                    "schema": post_schema(),
                }
            }
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::Timeout
                } else {
                    ScrapeError::Network {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let snippet: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(300)
                .collect();
            let detail = format!("LLM API returned {status}: {snippet}");
            error!(%status, "LLM API request failed");

            return Err(match status.as_u16() {
                401 | 402 | 403 => ScrapeError::LlmUnavailable { detail },
                429 => ScrapeError::LlmTransient { detail },
                s if s >= 500 => ScrapeError::LlmTransient { detail },
                _ => ScrapeError::LlmUnavailable { detail },
            });
        }

        let payload: Value = resp.json().await.map_err(|e| ScrapeError::MalformedOutput {
            detail: format!("unreadable completion body: {e}"),
        })?;

        parse_completion(&payload)
    }
}

/// Pull the structured message content out of a chat-completions payload.
pub(crate) fn parse_completion(payload: &Value) -> Result<InstagramPost, ScrapeError> {
    let content = payload["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ScrapeError::MalformedOutput {
            detail: "completion has no message content".to_string(),
        })?;

    serde_json::from_str(content).map_err(|e| ScrapeError::MalformedOutput {
        detail: format!("completion content is not a valid post object: {e}"),
    })
}

fn nullable(ty: &str) -> Value {
    json!({ "type": [ty, "null"] })
}

fn nullable_string_array() -> Value {
    json!({ "type": ["array", "null"], "items": { "type": "string" } })
}

/// JSON schema mirroring [`InstagramPost`]. Strict structured outputs
/// require every property listed in `required` with explicit nullability.
pub(crate) fn post_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "caption", "type", "url", "videoUrl", "imageUrl", "displayUrl",
            "shortCode", "timestamp", "likesCount", "commentsCount",
            "videoViewCount", "videoPlayCount", "ownerUsername",
            "ownerFullName", "locationName", "hashtags", "mentions", "alt"
        ],
        "properties": {
            "caption": nullable("string"),
            "type": { "type": ["string", "null"], "enum": ["image", "video", "carousel", null] },
            "url": nullable("string"),
            "videoUrl": nullable("string"),
            "imageUrl": nullable("string"),
            "displayUrl": nullable("string"),
            "shortCode": nullable("string"),
            "timestamp": nullable("string"),
            "likesCount": nullable("integer"),
            "commentsCount": nullable("integer"),
            "videoViewCount": nullable("integer"),
            "videoPlayCount": nullable("integer"),
            "ownerUsername": nullable("string"),
            "ownerFullName": nullable("string"),
            "locationName": nullable("string"),
            "hashtags": nullable_string_array(),
            "mentions": nullable_string_array(),
            "alt": nullable("string"),
        }
    })
}
