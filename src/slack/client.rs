//! Slack API client module
//!
//! Read calls are retried with backoff; `chat.postMessage` is sent once.

use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::*;
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::platform::ChatPlatform;
use crate::core::config::{DEFAULT_HISTORY_MAX_PAGES, DEFAULT_SLACK_API_BASE_URL, SlackConfig};
use crate::core::models::{ChatMessage, DirectoryUser, UserProfile};
use crate::errors::{RelayError, SLACK_RATELIMITED};
use crate::history::TimeWindow;

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

const HISTORY_PAGE_SIZE: u16 = 200;
const DIRECTORY_PAGE_SIZE: &str = "200";
const REPLIES_PAGE_SIZE: &str = "200";
/// Safety net against a cursor that never terminates.
const MAX_WEB_API_PAGES: usize = 100;

const MAX_RETRIES: usize = 3;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Retry `action` on transient failures only, sleeping roughly 100, 200 and
/// 400 ms (jittered) between attempts.
async fn with_retry<A, Fut, T>(action: A) -> Result<T, RelayError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
{
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(MAX_RETRY_DELAY)
        .map(jitter)
        .take(MAX_RETRIES);

    RetryIf::start(strategy, action, RelayError::is_transient).await
}

/// Follow cursors for up to `max_pages` pages.
///
/// A failure on the first page is returned. A failure on a later page is
/// logged and the items gathered so far are returned.
async fn collect_pages<T, F, Fut>(
    what: &str,
    max_pages: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, RelayError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>), RelayError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    for page in 0..max_pages {
        let (batch, next) = match fetch_page(cursor.clone()).await {
            Ok(result) => result,
            Err(e) if page > 0 => {
                warn!(page, error = %e, "{} pagination failed; keeping earlier pages", what);
                return Ok(items);
            }
            Err(e) => return Err(e),
        };
        items.extend(batch);

        match next {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }

    warn!(max_pages, "{} page cap reached; results truncated", what);
    Ok(items)
}

fn build_hyper_client(api_base_url: &str) -> Option<SlackHyperClient> {
    let connector = match HttpsConnector::<HttpConnector>::builder().with_native_roots() {
        Ok(builder) => builder.https_or_http().enable_all_versions().build(),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            return None;
        }
    };

    Some(SlackHyperClient::new(
        SlackClientHyperConnector::with_connector(connector).with_slack_api_url(api_base_url),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

/// One page of a raw cursor-paginated Web API listing.
trait CursorPage: DeserializeOwned + Send {
    type Item: Send;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Deserialize)]
struct RepliesPage {
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

impl CursorPage for RepliesPage {
    type Item = ChatMessage;

    fn into_parts(self) -> (Vec<ChatMessage>, Option<String>) {
        (self.messages, next_cursor(self.response_metadata))
    }
}

#[derive(Debug, Deserialize)]
struct MembersPage {
    #[serde(default)]
    members: Vec<DirectoryUser>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

impl CursorPage for MembersPage {
    type Item = DirectoryUser;

    fn into_parts(self) -> (Vec<DirectoryUser>, Option<String>) {
        (self.members, next_cursor(self.response_metadata))
    }
}

/// Slack signals the last page with a missing or empty cursor.
fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.next_cursor)
        .filter(|cursor| !cursor.is_empty())
}

/// Map a `slack-morphism` history message onto the crate's message model.
#[must_use]
pub fn chat_message_from_history(msg: SlackHistoryMessage) -> ChatMessage {
    // Subtypes serialize to Slack's wire names, e.g. "thread_broadcast".
    let subtype = msg
        .subtype
        .as_ref()
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(ToString::to_string));

    ChatMessage {
        user: msg.sender.user.map(|u| u.0),
        ts: msg.origin.ts.0,
        text: msg.content.text.unwrap_or_default(),
        thread_ts: msg.origin.thread_ts.map(|ts| ts.0),
        subtype,
    }
}

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    token: SlackApiToken,
    api_base_url: String,
    history_max_pages: u32,
    // None if the connector could not be built; calls then fail with ApiError.
    hyper: Option<SlackHyperClient>,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            api_base_url: DEFAULT_SLACK_API_BASE_URL.to_string(),
            history_max_pages: DEFAULT_HISTORY_MAX_PAGES,
            hyper: build_hyper_client(DEFAULT_SLACK_API_BASE_URL),
        }
    }

    #[must_use]
    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.slack_bot_token.clone())
            .with_api_base_url(&config.slack_api_base_url)
            .with_history_max_pages(config.history_max_pages)
    }

    /// Point every Web API call, raw or through slack-morphism, at `base_url`.
    #[must_use]
    pub fn with_api_base_url(mut self, base_url: &str) -> Self {
        self.api_base_url = base_url.trim_end_matches('/').to_string();
        self.hyper = build_hyper_client(&self.api_base_url);
        self
    }

    #[must_use]
    pub fn with_history_max_pages(mut self, pages: u32) -> Self {
        self.history_max_pages = pages.max(1);
        self
    }

    #[must_use]
    pub fn token(&self) -> &SlackApiToken {
        &self.token
    }

    fn hyper_client(&self) -> Result<&SlackHyperClient, RelayError> {
        self.hyper
            .as_ref()
            .ok_or_else(|| RelayError::ApiError("Slack HTTP connector not initialized".to_string()))
    }

    /// Call a read-only Web API method with form parameters and decode the
    /// payload once Slack reports `ok: true`.
    async fn web_api_get<T: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, RelayError> {
        let url = format!("{}/{}", self.api_base_url, method);

        with_retry(|| async {
            let resp = HTTP_CLIENT
                .post(&url)
                .bearer_auth(&self.token.token_value.0)
                .form(params)
                .send()
                .await
                .map_err(|e| RelayError::HttpError(format!("{method} HTTP: {e}")))?;

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(RelayError::RateLimitError(format!("{method} HTTP {status}")));
            }
            if status.is_server_error() {
                return Err(RelayError::HttpError(format!("{method} HTTP {status}")));
            }
            if !status.is_success() {
                return Err(RelayError::ApiError(format!("{method} HTTP {status}")));
            }

            let body: Value = resp
                .json()
                .await
                .map_err(|e| RelayError::ParseError(format!("{method} parse: {e}")))?;

            if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
                let code = body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let message = format!("{method} error: {code}");
                return Err(if code == SLACK_RATELIMITED {
                    RelayError::RateLimitError(message)
                } else {
                    RelayError::ApiError(message)
                });
            }

            serde_json::from_value(body)
                .map_err(|e| RelayError::ParseError(format!("{method} payload: {e}")))
        })
        .await
    }

    async fn web_api_page<P: CursorPage>(
        &self,
        method: &str,
        params: &[(&str, &str)],
        cursor: Option<String>,
    ) -> Result<(Vec<P::Item>, Option<String>), RelayError> {
        let mut params = params.to_vec();
        if let Some(cursor) = cursor.as_deref() {
            params.push(("cursor", cursor));
        }

        let page: P = self.web_api_get(method, &params).await?;
        Ok(page.into_parts())
    }

    async fn history_page(
        &self,
        channel_id: &str,
        window: TimeWindow,
        cursor: Option<String>,
    ) -> Result<(Vec<ChatMessage>, Option<String>), RelayError> {
        let client = self.hyper_client()?;

        with_retry(|| async {
            let session = client.open_session(&self.token);

            let mut request = SlackApiConversationsHistoryRequest::new()
                .with_channel(SlackChannelId(channel_id.to_string()))
                .with_oldest(SlackTs(window.oldest.to_string()))
                .with_latest(SlackTs(window.latest.to_string()))
                .with_inclusive(true)
                .with_limit(HISTORY_PAGE_SIZE);
            if let Some(cursor) = &cursor {
                request = request.with_cursor(SlackCursorId(cursor.clone()));
            }

            let result = session.conversations_history(&request).await?;
            let next = result
                .response_metadata
                .and_then(|m| m.next_cursor)
                .map(|c| c.0)
                .filter(|c| !c.is_empty());
            let messages = result
                .messages
                .into_iter()
                .map(chat_message_from_history)
                .collect();

            Ok((messages, next))
        })
        .await
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    /// Pages through `conversations.history` until the cursor runs out or the
    /// page cap is reached.
    async fn fetch_history(
        &self,
        channel_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<ChatMessage>, RelayError> {
        let max_pages = usize::try_from(self.history_max_pages).unwrap_or(usize::MAX);

        let messages = collect_pages("conversations.history", max_pages, |cursor| {
            self.history_page(channel_id, window, cursor)
        })
        .await?;

        debug!(channel_id, count = messages.len(), "Fetched history");
        Ok(messages)
    }

    async fn fetch_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<ChatMessage>, RelayError> {
        let params = [
            ("channel", channel_id),
            ("ts", thread_ts),
            ("inclusive", "true"),
            ("limit", REPLIES_PAGE_SIZE),
        ];

        let messages = collect_pages("conversations.replies", MAX_WEB_API_PAGES, |cursor| {
            self.web_api_page::<RepliesPage>("conversations.replies", &params, cursor)
        })
        .await?;

        debug!(channel_id, thread_ts, count = messages.len(), "Fetched thread");
        Ok(messages)
    }

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, RelayError> {
        let params = [("limit", DIRECTORY_PAGE_SIZE)];

        collect_pages("users.list", MAX_WEB_API_PAGES, |cursor| {
            self.web_api_page::<MembersPage>("users.list", &params, cursor)
        })
        .await
    }

    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser, RelayError> {
        let client = self.hyper_client()?;

        with_retry(|| async {
            let session = client.open_session(&self.token);
            let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));

            let user = session.users_info(&request).await?.user;

            Ok(DirectoryUser {
                id: user.id.0,
                real_name: user.real_name,
                profile: Some(UserProfile {
                    real_name: user.profile.and_then(|p| p.real_name),
                }),
            })
        })
        .await
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: &str,
    ) -> Result<(), RelayError> {
        let session = self.hyper_client()?.open_session(&self.token);

        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel_id.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        )
        .with_thread_ts(SlackTs(thread_ts.to_string()));

        session.chat_post_message(&request).await?;

        Ok(())
    }
}
