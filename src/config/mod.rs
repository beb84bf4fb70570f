use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    /// Base URL of the OpenAI-compatible API. Overridable so tests can point
    /// the extractor at a local mock server.
    pub openai_base_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Whole-pipeline deadline for a single scrape request.
    pub scrape_timeout: Duration,
    /// HTTP timeout on each LLM call.
    pub llm_timeout: Duration,
    /// Per-attempt deadline for the browser fetch.
    pub fetch_timeout: Duration,
    /// Extra settle time after navigation so dynamic content can load.
    pub browser_wait: Duration,
    pub max_retries: u32,
    /// Fixed delay between retry attempts. No backoff curve.
    pub retry_delay: Duration,
    pub default_rate_limit_per_minute: u32,
    pub scrape_rate_limit_per_minute: u32,
    /// Page text is truncated to this many characters before the LLM call.
    pub llm_max_content_chars: usize,
    pub is_dev: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        Ok(Config {
            openai_api_key,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed("SERVER_PORT", 5000)?,
            scrape_timeout: Duration::from_secs(parsed("SCRAPE_TIMEOUT_SECS", 60)?),
            llm_timeout: Duration::from_secs(parsed("LLM_TIMEOUT_SECS", 30)?),
            fetch_timeout: Duration::from_secs(parsed("FETCH_TIMEOUT_SECS", 30)?),
            browser_wait: Duration::from_millis(parsed("BROWSER_WAIT_MS", 3000)?),
            max_retries: parsed("MAX_RETRIES", 3)?,
            retry_delay: Duration::from_secs(parsed("RETRY_DELAY_SECS", 2)?),
            default_rate_limit_per_minute: parsed("DEFAULT_RATE_LIMIT_PER_MINUTE", 30)?,
            scrape_rate_limit_per_minute: parsed("SCRAPE_RATE_LIMIT_PER_MINUTE", 10)?,
            llm_max_content_chars: parsed("LLM_MAX_CONTENT_CHARS", 20_000)?,
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Read and parse an optional environment variable. A present-but-invalid
/// value is a startup error rather than a silent fallback.
fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            openai_api_key: "sk-test".into(),
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.into(),
            server_host: "127.0.0.1".into(),
            server_port: 5000,
            scrape_timeout: Duration::from_secs(60),
            llm_timeout: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(30),
            browser_wait: Duration::from_millis(3000),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            default_rate_limit_per_minute: 30,
            scrape_rate_limit_per_minute: 10,
            llm_max_content_chars: 20_000,
            is_dev: true,
        }
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        assert_eq!(test_config().server_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn missing_variable_yields_default() {
        assert_eq!(
            parsed::<u32>("NO_SUCH_VARIABLE_FOR_THIS_TEST", 7).unwrap(),
            7
        );
    }
}
