//! All Slack-specific functionality

pub mod client;
pub mod platform;

pub use client::SlackClient;
pub use platform::ChatPlatform;
