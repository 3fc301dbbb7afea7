//! Event proxy: relays Slack Events API deliveries to the answer API and
//! posts the answer back into the originating thread.
//!
//! Only problems with the inbound delivery itself are answered with a value.
//! Anything that fails after forwarding has begun (answer API, posting) is
//! returned as an error so the invocation aborts instead of half-completing.

pub mod handler;
pub mod parsing;
pub mod signature;

pub use handler::handler;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::answer::AnswerApi;
use crate::errors::RelayError;
use crate::slack::ChatPlatform;
use parsing::{SIGNATURE_HEADER, TIMESTAMP_HEADER, body_text, get_header_str, retry_num, v_str};

pub const RETRY_ACK_BODY: &str = "Retry received";
pub const PARSE_FAILURE_MESSAGE: &str = "cannot parse event body";

/// Result value handed back to the invocation boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProxyOutcome {
    /// HTTP-style response: retry acknowledgements and signature rejections.
    Status {
        #[serde(rename = "statusCode")]
        status_code: u16,
        body: String,
    },
    /// The inbound event, returned untouched because it had no body.
    Passthrough(Value),
    ParseFailure { error: String, body: Value },
    Challenge { challenge: Value },
    Answer(String),
}

impl ProxyOutcome {
    #[must_use]
    pub fn retry_ack() -> Self {
        ProxyOutcome::Status {
            status_code: 200,
            body: RETRY_ACK_BODY.to_string(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: &str) -> Self {
        ProxyOutcome::Status {
            status_code: 401,
            body: json!({ "error": message }).to_string(),
        }
    }
}

/// Where the answer gets posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub channel: String,
    pub thread_ts: String,
}

/// Reply in the event's thread, or start one under the event itself.
///
/// # Errors
///
/// Returns `RelayError::ParseError` if the body lacks `event.channel` or both
/// `event.thread_ts` and `event.ts`.
pub fn reply_target(body: &Value) -> Result<ReplyTarget, RelayError> {
    let channel = v_str(body, &["event", "channel"])
        .ok_or_else(|| RelayError::ParseError("event.channel missing".to_string()))?;
    let thread_ts = v_str(body, &["event", "thread_ts"])
        .or_else(|| v_str(body, &["event", "ts"]))
        .ok_or_else(|| RelayError::ParseError("event.ts missing".to_string()))?;

    Ok(ReplyTarget {
        channel: channel.to_string(),
        thread_ts: thread_ts.to_string(),
    })
}

/// Collaborators and settings for one proxy invocation.
pub struct ProxyContext<'a> {
    pub platform: &'a dyn ChatPlatform,
    pub answers: &'a dyn AnswerApi,
    /// When set, requests must carry a valid Slack signature.
    pub signing_secret: Option<&'a str>,
}

fn signature_rejection(event: &Value, body: &str, secret: &str) -> Option<ProxyOutcome> {
    let headers = event.get("headers").unwrap_or(&Value::Null);

    let Some(sig) = get_header_str(headers, SIGNATURE_HEADER) else {
        error!("Missing X-Slack-Signature header");
        return Some(ProxyOutcome::unauthorized("Missing X-Slack-Signature header"));
    };
    let Some(timestamp) = get_header_str(headers, TIMESTAMP_HEADER) else {
        error!("Missing X-Slack-Request-Timestamp header");
        return Some(ProxyOutcome::unauthorized(
            "Missing X-Slack-Request-Timestamp header",
        ));
    };

    if signature::verify_slack_signature(body, timestamp, sig, secret) {
        None
    } else {
        Some(ProxyOutcome::unauthorized("Invalid Slack signature"))
    }
}

/// Process one inbound delivery.
///
/// # Errors
///
/// Returns an error if the answer API call fails or violates its contract,
/// the event lacks a reply target, or posting the reply fails.
pub async fn handle(event: &Value, ctx: &ProxyContext<'_>) -> Result<ProxyOutcome, RelayError> {
    if let Some(retry) = retry_num(event) {
        info!(retry_num = %retry, "Retry delivery received; acknowledging");
        return Ok(ProxyOutcome::retry_ack());
    }

    let Some(raw_body) = event.get("body") else {
        warn!("Event has no body; passing it through");
        return Ok(ProxyOutcome::Passthrough(event.clone()));
    };

    let text = match body_text(event, raw_body) {
        Ok(text) => text,
        Err(reason) => {
            warn!(reason = %reason, "Cannot read event body");
            return Ok(ProxyOutcome::ParseFailure {
                error: PARSE_FAILURE_MESSAGE.to_string(),
                body: raw_body.clone(),
            });
        }
    };

    if let Some(secret) = ctx.signing_secret
        && let Some(rejection) = signature_rejection(event, &text, secret)
    {
        return Ok(rejection);
    }

    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Cannot parse event body");
            return Ok(ProxyOutcome::ParseFailure {
                error: PARSE_FAILURE_MESSAGE.to_string(),
                body: raw_body.clone(),
            });
        }
    };

    if v_str(&body, &["type"]) == Some("url_verification") {
        let challenge = body
            .get("challenge")
            .cloned()
            .ok_or_else(|| RelayError::ParseError("url_verification without challenge".into()))?;
        info!("Answering URL verification challenge");
        return Ok(ProxyOutcome::Challenge { challenge });
    }

    let answer = ctx.answers.answer(&body).await?;
    let target = reply_target(&body)?;

    ctx.platform
        .post_message(&target.channel, &answer, &target.thread_ts)
        .await?;
    info!(
        channel = %target.channel,
        thread_ts = %target.thread_ts,
        "Posted answer"
    );

    Ok(ProxyOutcome::Answer(answer))
}
