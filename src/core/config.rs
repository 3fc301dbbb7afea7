use std::env;

use url::Url;

use crate::errors::RelayError;

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_HISTORY_MAX_PAGES: u32 = 10;

/// Slack credentials and tuning shared by both handlers.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub slack_bot_token: String,
    pub slack_signing_secret: Option<String>,
    pub slack_api_base_url: String,
    pub history_max_pages: u32,
}

impl SlackConfig {
    /// # Errors
    ///
    /// Returns `RelayError::ConfigError` if `SLACK_BOT_TOKEN` is missing or
    /// `SLACK_HISTORY_MAX_PAGES` is not a positive integer.
    pub fn from_env() -> Result<Self, RelayError> {
        let history_max_pages = match env::var("SLACK_HISTORY_MAX_PAGES") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|pages| *pages > 0)
                .ok_or_else(|| {
                    RelayError::ConfigError(format!(
                        "SLACK_HISTORY_MAX_PAGES: expected a positive integer, got '{raw}'"
                    ))
                })?,
            Err(_) => DEFAULT_HISTORY_MAX_PAGES,
        };

        Ok(Self {
            slack_bot_token: env::var("SLACK_BOT_TOKEN")
                .map_err(|e| RelayError::ConfigError(format!("SLACK_BOT_TOKEN: {e}")))?,
            slack_signing_secret: env::var("SLACK_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            slack_api_base_url: env::var("SLACK_API_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SLACK_API_BASE_URL.to_string()),
            history_max_pages,
        })
    }
}

/// Endpoint and key of the external answer API.
#[derive(Debug, Clone)]
pub struct AnswerApiConfig {
    pub api_url: Url,
    pub api_key: String,
}

impl AnswerApiConfig {
    /// # Errors
    ///
    /// Returns `RelayError::ConfigError` if `FLEAK_API_URL` or `FLEAK_API_KEY`
    /// is missing, or the URL does not parse.
    pub fn from_env() -> Result<Self, RelayError> {
        let raw_url = env::var("FLEAK_API_URL")
            .map_err(|e| RelayError::ConfigError(format!("FLEAK_API_URL: {e}")))?;
        let api_url = Url::parse(&raw_url)
            .map_err(|e| RelayError::ConfigError(format!("FLEAK_API_URL: {e}")))?;

        Ok(Self {
            api_url,
            api_key: env::var("FLEAK_API_KEY")
                .map_err(|e| RelayError::ConfigError(format!("FLEAK_API_KEY: {e}")))?,
        })
    }
}
