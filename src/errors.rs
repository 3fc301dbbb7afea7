use slack_morphism::errors::SlackClientError;
use thiserror::Error;

/// Slack's `error` code for a throttled Web API call.
pub const SLACK_RATELIMITED: &str = "ratelimited";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to parse event: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Rate limited by Slack API: {0}")]
    RateLimitError(String),

    #[error("Answer API contract violated: {0}")]
    AnswerError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl RelayError {
    /// Transport failures, server errors and throttling. Everything else is
    /// permanent for the request that caused it.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, RelayError::HttpError(_) | RelayError::RateLimitError(_))
    }
}

impl From<SlackClientError> for RelayError {
    fn from(error: SlackClientError) -> Self {
        match &error {
            SlackClientError::RateLimitError(_) => RelayError::RateLimitError(error.to_string()),
            SlackClientError::ApiError(api) if api.code == SLACK_RATELIMITED => {
                RelayError::RateLimitError(error.to_string())
            }
            SlackClientError::HttpProtocolError(_) => RelayError::HttpError(error.to_string()),
            SlackClientError::HttpError(http) if http.status_code.is_server_error() => {
                RelayError::HttpError(error.to_string())
            }
            _ => RelayError::ApiError(error.to_string()),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        RelayError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        RelayError::ApiError(error.to_string())
    }
}
