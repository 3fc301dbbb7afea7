use serde::{Deserialize, Serialize};

/// Aggregator invocation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub channel_id: String,
    pub hours_before: f64,
}

/// Normalized conversation history returned by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub threads: Vec<Thread>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub user: String,
    pub timestamp: String,
    pub text: String,
}

pub const THREAD_BROADCAST_SUBTYPE: &str = "thread_broadcast";

/// A message as returned by Slack's history and replies endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub user: Option<String>,
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl ChatMessage {
    #[must_use]
    pub fn is_thread_broadcast(&self) -> bool {
        self.subtype.as_deref() == Some(THREAD_BROADCAST_SUBTYPE)
    }

    /// Key of the thread this message belongs to: its `thread_ts`, or its own
    /// `ts` when it is not part of a thread.
    #[must_use]
    pub fn thread_key(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
}

/// A workspace member as returned by `users.list` / `users.info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl DirectoryUser {
    fn profile_real_name(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.real_name.as_deref())
    }

    /// Name used when the user came from the bulk `users.list` listing.
    #[must_use]
    pub fn listed_name(&self) -> Option<&str> {
        self.real_name.as_deref().or_else(|| self.profile_real_name())
    }

    /// Name used when the user came from an individual `users.info` lookup.
    #[must_use]
    pub fn looked_up_name(&self) -> Option<&str> {
        self.profile_real_name().or(self.real_name.as_deref())
    }
}
