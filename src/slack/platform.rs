use async_trait::async_trait;

use crate::core::models::{ChatMessage, DirectoryUser};
use crate::errors::RelayError;
use crate::history::TimeWindow;

/// The slice of Slack's Web API the handlers depend on.
///
/// Handlers receive an implementation explicitly so they can run against
/// in-memory fakes as well as the real [`super::SlackClient`].
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Top-level messages posted in `channel_id` within `window` (both bounds
    /// inclusive), newest first.
    async fn fetch_history(
        &self,
        channel_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<ChatMessage>, RelayError>;

    /// All messages of the thread rooted at `thread_ts`. The first element is
    /// the root itself.
    async fn fetch_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<ChatMessage>, RelayError>;

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, RelayError>;

    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser, RelayError>;

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: &str,
    ) -> Result<(), RelayError>;
}
