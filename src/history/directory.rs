//! Request-scoped user directory and mention rewriting.

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::core::models::ChatMessage;
use crate::slack::ChatPlatform;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@([A-Z0-9]+)>").expect("static regex compile"));

/// Display names keyed by user id, iterated in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    names: BTreeMap<String, String>,
}

impl UserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(user_id.into(), name.into());
    }

    #[must_use]
    pub fn name(&self, user_id: &str) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.names.contains_key(user_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

/// Every author id plus every id mentioned as `<@ID>` in the messages.
#[must_use]
pub fn extract_user_ids(messages: &[ChatMessage]) -> BTreeSet<String> {
    let mut user_ids = BTreeSet::new();
    for msg in messages {
        if let Some(user) = &msg.user {
            user_ids.insert(user.clone());
        }
        for cap in MENTION_RE.captures_iter(&msg.text) {
            user_ids.insert(cap[1].to_string());
        }
    }
    user_ids
}

/// Resolve `user_ids` to display names.
///
/// One bulk `users.list` pass first; ids it did not resolve are looked up
/// individually. Failed individual lookups are logged and left out. If the
/// bulk listing fails, the (empty) directory is returned as is.
pub async fn resolve_user_directory(
    platform: &dyn ChatPlatform,
    user_ids: &BTreeSet<String>,
) -> UserDirectory {
    let mut directory = UserDirectory::new();
    if user_ids.is_empty() {
        return directory;
    }

    let members = match platform.list_users().await {
        Ok(members) => members,
        Err(e) => {
            warn!(error = %e, "Error fetching user info");
            return directory;
        }
    };

    for member in &members {
        if user_ids.contains(&member.id)
            && let Some(name) = member.listed_name()
        {
            directory.insert(member.id.clone(), name);
        }
    }

    let missing: Vec<&String> = user_ids
        .iter()
        .filter(|id| !directory.contains(id))
        .collect();
    if !missing.is_empty() {
        info!(count = missing.len(), "Looking up users missing from listing");
    }

    let lookups = join_all(missing.iter().map(|id| platform.get_user(id.as_str()))).await;
    for (user_id, lookup) in missing.into_iter().zip(lookups) {
        match lookup {
            Ok(user) => match user.looked_up_name() {
                Some(name) => directory.insert(user_id.clone(), name),
                None => warn!(user_id = %user_id, "User has no real name"),
            },
            Err(e) => warn!(user_id = %user_id, error = %e, "Error fetching info for user"),
        }
    }

    directory
}

/// Replace `<@ID>` tokens with resolved display names.
///
/// Applies one literal substring replacement per directory entry, in
/// ascending id order. Tokens for unresolved ids are left verbatim. A display
/// name that itself contains another user's token is rewritten or not
/// depending on that order.
#[must_use]
pub fn rewrite_mentions(text: &str, directory: &UserDirectory) -> String {
    let mut text = text.to_string();
    for (user_id, name) in directory.iter() {
        let token = format!("<@{user_id}>");
        if text.contains(&token) {
            text = text.replace(&token, name);
        }
    }
    text
}
