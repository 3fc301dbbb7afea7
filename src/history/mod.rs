//! History aggregator: flattens a channel's recent threads into a transcript.
//!
//! Every Slack read here fails soft. A partial transcript is preferable to
//! none, so fetch errors are logged and degrade to empty results.

pub mod directory;
pub mod handler;
pub mod window;

pub use directory::{UserDirectory, extract_user_ids, resolve_user_directory, rewrite_mentions};
pub use handler::handler;
pub use window::TimeWindow;

use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::core::models::{ChatMessage, Message, Thread, Transcript};
use crate::slack::ChatPlatform;
use crate::utils::fallible::or_empty;
use crate::utils::timestamps::slack_ts_to_iso;

pub const UNKNOWN_USER: &str = "Unknown";

/// Messages grouped under their thread key, in first-seen key order.
/// `thread_broadcast` copies are dropped.
#[must_use]
pub fn group_threads(messages: &[ChatMessage]) -> Vec<(String, Vec<ChatMessage>)> {
    let mut threads: Vec<(String, Vec<ChatMessage>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for msg in messages.iter().filter(|m| !m.is_thread_broadcast()) {
        let key = msg.thread_key();
        match index.get(key) {
            Some(&slot) => threads[slot].1.push(msg.clone()),
            None => {
                index.insert(key.to_string(), threads.len());
                threads.push((key.to_string(), vec![msg.clone()]));
            }
        }
    }

    threads
}

fn format_timestamp(ts: &str) -> String {
    slack_ts_to_iso(ts).unwrap_or_else(|| {
        warn!(ts, "Unparseable Slack timestamp; keeping raw value");
        ts.to_string()
    })
}

/// Render one platform message, or `None` for authorless system messages.
#[must_use]
pub fn render_message(msg: &ChatMessage, directory: &UserDirectory) -> Option<Message> {
    let user_id = msg.user.as_deref()?;

    Some(Message {
        user: directory.name(user_id).unwrap_or(UNKNOWN_USER).to_string(),
        timestamp: format_timestamp(&msg.ts),
        text: rewrite_mentions(&msg.text, directory),
    })
}

async fn fetch_thread_replies(
    platform: &dyn ChatPlatform,
    channel_id: &str,
    thread_ts: &str,
) -> Vec<ChatMessage> {
    let mut replies = or_empty(
        platform.fetch_replies(channel_id, thread_ts).await,
        "thread messages",
    );
    // The root is already part of the channel history.
    if !replies.is_empty() {
        replies.remove(0);
    }
    replies
}

/// Build the transcript for `channel_id` over `window`.
pub async fn aggregate(
    platform: &dyn ChatPlatform,
    channel_id: &str,
    window: TimeWindow,
) -> Transcript {
    let messages = or_empty(
        platform.fetch_history(channel_id, window).await,
        "conversation history",
    );
    info!(channel_id, count = messages.len(), "Fetched conversation history");

    let user_ids = extract_user_ids(&messages);
    let directory = resolve_user_directory(platform, &user_ids).await;
    info!(
        requested = user_ids.len(),
        resolved = directory.len(),
        "Resolved user directory"
    );

    let grouped = group_threads(&messages);
    let replies = join_all(
        grouped
            .iter()
            .map(|(thread_ts, _)| fetch_thread_replies(platform, channel_id, thread_ts)),
    )
    .await;

    let threads = grouped
        .into_iter()
        .zip(replies)
        .map(|((_, members), replies)| Thread {
            messages: members
                .iter()
                .chain(replies.iter())
                .filter_map(|msg| render_message(msg, &directory))
                .collect(),
        })
        .collect();

    Transcript {
        threads,
        earliest: messages.last().map(|m| format_timestamp(&m.ts)),
        latest: messages.first().map(|m| format_timestamp(&m.ts)),
    }
}
