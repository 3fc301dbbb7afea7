#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use slack_relay::answer::AnswerApi;
use slack_relay::core::models::{ChatMessage, DirectoryUser, UserProfile};
use slack_relay::errors::RelayError;
use slack_relay::history::TimeWindow;
use slack_relay::slack::ChatPlatform;
use std::collections::HashMap;
use std::sync::Mutex;

pub fn message(user: Option<&str>, ts: &str, text: &str) -> ChatMessage {
    ChatMessage {
        user: user.map(ToString::to_string),
        ts: ts.to_string(),
        text: text.to_string(),
        thread_ts: None,
        subtype: None,
    }
}

pub fn threaded(user: Option<&str>, ts: &str, thread_ts: &str, text: &str) -> ChatMessage {
    ChatMessage {
        thread_ts: Some(thread_ts.to_string()),
        ..message(user, ts, text)
    }
}

pub fn listed_user(id: &str, real_name: &str) -> DirectoryUser {
    DirectoryUser {
        id: id.to_string(),
        real_name: Some(real_name.to_string()),
        profile: None,
    }
}

pub fn looked_up_user(id: &str, real_name: &str) -> DirectoryUser {
    DirectoryUser {
        id: id.to_string(),
        real_name: None,
        profile: Some(UserProfile {
            real_name: Some(real_name.to_string()),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub text: String,
    pub thread_ts: String,
}

/// In-memory Slack workspace. Anything not configured behaves like a
/// failing API call.
#[derive(Default)]
pub struct FakePlatform {
    pub history: Option<Vec<ChatMessage>>,
    /// Full thread listings (root first), keyed by thread ts.
    pub replies: HashMap<String, Vec<ChatMessage>>,
    pub members: Option<Vec<DirectoryUser>>,
    pub lookups: HashMap<String, DirectoryUser>,
    pub fail_post: bool,
    pub windows: Mutex<Vec<TimeWindow>>,
    pub reply_requests: Mutex<Vec<String>>,
    pub user_requests: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<PostedMessage>>,
}

impl FakePlatform {
    pub fn with_history(history: Vec<ChatMessage>) -> Self {
        Self {
            history: Some(history),
            members: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn thread(mut self, thread_ts: &str, messages: Vec<ChatMessage>) -> Self {
        self.replies.insert(thread_ts.to_string(), messages);
        self
    }

    pub fn members(mut self, members: Vec<DirectoryUser>) -> Self {
        self.members = Some(members);
        self
    }

    pub fn lookup(mut self, user: DirectoryUser) -> Self {
        self.lookups.insert(user.id.clone(), user);
        self
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().unwrap().clone()
    }

    pub fn user_requests(&self) -> Vec<String> {
        let mut requests = self.user_requests.lock().unwrap().clone();
        requests.sort();
        requests
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn fetch_history(
        &self,
        _channel_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<ChatMessage>, RelayError> {
        self.windows.lock().unwrap().push(window);
        self.history
            .clone()
            .ok_or_else(|| RelayError::ApiError("channel_not_found".to_string()))
    }

    async fn fetch_replies(
        &self,
        _channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<ChatMessage>, RelayError> {
        self.reply_requests
            .lock()
            .unwrap()
            .push(thread_ts.to_string());
        self.replies
            .get(thread_ts)
            .cloned()
            .ok_or_else(|| RelayError::ApiError("thread_not_found".to_string()))
    }

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, RelayError> {
        self.members
            .clone()
            .ok_or_else(|| RelayError::ApiError("ratelimited".to_string()))
    }

    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser, RelayError> {
        self.user_requests.lock().unwrap().push(user_id.to_string());
        self.lookups
            .get(user_id)
            .cloned()
            .ok_or_else(|| RelayError::ApiError("user_not_found".to_string()))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: &str,
    ) -> Result<(), RelayError> {
        if self.fail_post {
            return Err(RelayError::ApiError("not_in_channel".to_string()));
        }
        self.posted.lock().unwrap().push(PostedMessage {
            channel: channel_id.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.to_string(),
        });
        Ok(())
    }
}

/// Answer API double that records every forwarded event.
pub struct FakeAnswers {
    pub response: Result<String, String>,
    pub calls: Mutex<Vec<Value>>,
}

impl FakeAnswers {
    pub fn answering(answer: &str) -> Self {
        Self {
            response: Ok(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AnswerApi for FakeAnswers {
    async fn answer(&self, event: &Value) -> Result<String, RelayError> {
        self.calls.lock().unwrap().push(event.clone());
        self.response.clone().map_err(RelayError::AnswerError)
    }
}
