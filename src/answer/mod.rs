//! Client for the external answer-generation API.
//!
//! The API follows a batch convention: it takes a JSON array of events and
//! returns `{"outputEvents": [{"answer": ...}, ...]}`.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::core::config::AnswerApiConfig;
use crate::errors::RelayError;

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Produces an answer for an inbound Slack event.
#[async_trait]
pub trait AnswerApi: Send + Sync {
    async fn answer(&self, event: &Value) -> Result<String, RelayError>;
}

/// Pull `outputEvents[0].answer` out of an answer API response.
///
/// # Errors
///
/// Returns `RelayError::AnswerError` if there are no output events or the
/// first one carries no string `answer`.
pub fn extract_answer(response: &Value) -> Result<String, RelayError> {
    let first = response
        .get("outputEvents")
        .and_then(Value::as_array)
        .and_then(|events| events.first())
        .ok_or_else(|| {
            RelayError::AnswerError("response contains no outputEvents".to_string())
        })?;

    first
        .get("answer")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            RelayError::AnswerError("first output event has no string answer".to_string())
        })
}

pub struct AnswerClient {
    api_url: Url,
    api_key: String,
}

impl AnswerClient {
    #[must_use]
    pub fn new(api_url: Url, api_key: String) -> Self {
        Self { api_url, api_key }
    }

    #[must_use]
    pub fn from_config(config: &AnswerApiConfig) -> Self {
        Self::new(config.api_url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl AnswerApi for AnswerClient {
    /// Single attempt; the caller treats any failure as fatal.
    async fn answer(&self, event: &Value) -> Result<String, RelayError> {
        let resp = HTTP_CLIENT
            .post(self.api_url.clone())
            .header("api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&[event])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(RelayError::HttpError(format!(
                "answer API HTTP {status}: {body_text}"
            )));
        }

        let body: Value = resp.json().await?;
        let answer = extract_answer(&body)?;
        info!(answer = %answer, "Answer API response");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_answer_reads_first_output_event() {
        let response = json!({"outputEvents": [{"answer": "42"}, {"answer": "ignored"}]});
        assert_eq!(extract_answer(&response).unwrap(), "42");
    }

    #[test]
    fn test_extract_answer_rejects_empty_output() {
        for response in [json!({}), json!({"outputEvents": []}), json!({"outputEvents": {}})] {
            match extract_answer(&response) {
                Err(RelayError::AnswerError(msg)) => assert!(msg.contains("outputEvents")),
                other => panic!("Expected AnswerError, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_extract_answer_rejects_missing_answer() {
        let response = json!({"outputEvents": [{"answer": null}]});
        assert!(matches!(
            extract_answer(&response),
            Err(RelayError::AnswerError(_))
        ));
    }
}
